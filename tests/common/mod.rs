#![allow(unused_imports)]

pub use svctest_test_utils::builders;
pub use svctest_test_utils::{init_tracing, with_timeout};
