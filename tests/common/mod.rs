//! Shared test support: a one-time `tracing_subscriber` init so engine
//! `debug`/`warn` spans (request submission/completion) are visible under
//! `--nocapture` without every test file wiring up its own subscriber.

use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}
