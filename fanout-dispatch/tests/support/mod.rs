use fanout_dispatch::IdGenError;
use uuid::Uuid;

/// One-time tracing bootstrap for the integration suites. Library code never
/// installs a subscriber; test binaries do.
pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Generator that always yields the same id, used to force collisions.
#[allow(dead_code)]
pub(crate) fn fixed_id_generator() -> Result<Uuid, IdGenError> {
    Ok(Uuid::from_bytes([
        254, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    ]))
}

#[allow(dead_code)]
pub(crate) fn v4_generator() -> Result<Uuid, IdGenError> {
    Ok(Uuid::new_v4())
}
