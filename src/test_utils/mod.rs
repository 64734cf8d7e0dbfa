#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod http;

pub(crate) use db::{create_test_user, get_test_connection};
pub(crate) use http::{
    assert_content_type, assert_status, assert_status_ok, get_header, parse_json_body,
};
