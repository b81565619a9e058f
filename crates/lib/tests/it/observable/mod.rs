//! Stream composition tests

mod stream_tests;
