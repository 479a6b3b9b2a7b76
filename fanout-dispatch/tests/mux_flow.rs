/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use std::sync::Arc;
use std::time::Duration;

use fanout_dispatch::{DispatchError, Dispatcher, Mux};
use tokio::time::timeout;
use uuid::Uuid;

async fn running_mux() -> (Arc<Dispatcher<&'static str>>, Mux<&'static str>) {
    support::init_logging();
    let dispatcher = Arc::new(Dispatcher::new());
    dispatcher.start(0, 0).await.expect("start should succeed");
    (dispatcher.clone(), Mux::new(dispatcher))
}

#[tokio::test]
async fn mux_publish_validates_and_delivers_end_to_end() {
    let (_dispatcher, mux) = running_mux().await;

    assert!(matches!(mux.publish(&"lol", &[]), Err(DispatchError::NoIds)));

    let id = mux.get_id().await.expect("id should be minted");
    assert!(mux.minted_ids().await.contains(&id));

    assert!(matches!(
        mux.subscribe(Uuid::nil()).await,
        Err(DispatchError::IdNotSet)
    ));

    let pipe = mux.subscribe(id).await.expect("pipe should build");
    mux.publish(&"string", &[id]).expect("publish should succeed");

    let received = timeout(Duration::from_secs(1), pipe.recv())
        .await
        .expect("delivery should not time out");
    assert_eq!(received, Some("string"));

    pipe.release().await.expect("release should succeed");
}

#[tokio::test]
async fn a_thousand_pipes_share_one_channel_and_release_without_leaks() {
    let (dispatcher, mux) = running_mux().await;
    let id = mux.get_id().await.expect("id should be minted");

    let mut pipes = Vec::with_capacity(1000);
    for _ in 0..1000 {
        pipes.push(mux.subscribe(id).await.expect("subscribe should succeed"));
    }

    // One underlying dispatcher subscription regardless of pipe count.
    assert_eq!(dispatcher.subscriber_count(id).await, Some(1));
    let shared_id = pipes[0].channel().id();
    assert!(pipes.iter().all(|pipe| pipe.channel().id() == shared_id));

    for pipe in pipes {
        pipe.release().await.expect("release should succeed");
    }

    // The route survives with zero subscribers; the channel went back to
    // the pool.
    assert!(dispatcher.has_route(id).await);
    assert_eq!(dispatcher.subscriber_count(id).await, Some(0));
}

#[tokio::test]
async fn mux_unsubscribe_delegates_to_the_dispatcher() {
    let (dispatcher, mux) = running_mux().await;
    let id = mux.get_id().await.expect("id should be minted");

    let pipe = mux.subscribe(id).await.expect("pipe should build");
    assert_eq!(dispatcher.subscriber_count(id).await, Some(1));

    mux.unsubscribe(id, pipe.channel())
        .await
        .expect("unsubscribe should succeed");
    assert_eq!(dispatcher.subscriber_count(id).await, Some(0));
}

#[tokio::test]
async fn pipes_compete_for_messages_on_the_shared_channel() {
    let (_dispatcher, mux) = running_mux().await;
    let id = mux.get_id().await.expect("id should be minted");

    let first = mux.subscribe(id).await.expect("first pipe should build");
    let second = mux.subscribe(id).await.expect("second pipe should reuse");

    mux.publish(&"only-once", &[id]).expect("publish should succeed");

    let received = timeout(Duration::from_secs(1), first.recv())
        .await
        .expect("delivery should not time out");
    assert_eq!(received, Some("only-once"));

    // The message reached exactly one pipe.
    assert!(second.channel().try_recv().await.is_err());

    first.release().await.expect("release should succeed");
    second.release().await.expect("release should succeed");
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_publishers_never_block_each_other() {
    let (dispatcher, mux) = running_mux().await;
    let id = mux.get_id().await.expect("id should be minted");
    let pipe = mux.subscribe(id).await.expect("pipe should build");

    let mux = Arc::new(mux);
    let mut publishers = Vec::new();
    for _ in 0..4 {
        let mux = mux.clone();
        publishers.push(tokio::spawn(async move {
            for _ in 0..25 {
                // JobsAtLimit is the only acceptable failure under load.
                if let Err(err) = mux.publish(&"burst", &[id]) {
                    assert!(err.is_retryable());
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    for publisher in futures::future::join_all(publishers).await {
        publisher.expect("publisher task should not panic");
    }

    let received = timeout(Duration::from_secs(1), pipe.recv())
        .await
        .expect("at least one delivery should land");
    assert_eq!(received, Some("burst"));

    pipe.release().await.expect("release should succeed");
    dispatcher.stop().await.expect("stop should succeed");
}
