//! Per-verb convenience surface over [`Networking::request`], fakes and
//! cancel-by-path.

use super::client::Networking;
use crate::fake::FixtureLocator;
use crate::request::{Parameters, RequestId, Verb};
use crate::response::CompletionResult;
use serde_json::Value;

macro_rules! verb_methods {
    (
        $verb:expr,
        $name:literal,
        $call:ident,
        $call_with:ident,
        $fake:ident,
        $fake_status:ident,
        $fake_file:ident,
        $cancel:ident
    ) => {
        #[doc = concat!("Issue a ", $name, " request without parameters.")]
        pub fn $call<F>(&self, path: &str, completion: F) -> RequestId
        where
            F: FnOnce(CompletionResult) + Send + 'static,
        {
            self.request($verb, path, &Parameters::new(), completion)
        }

        #[doc = concat!("Issue a ", $name, " request with parameters.")]
        pub fn $call_with<F>(&self, path: &str, parameters: &Parameters, completion: F) -> RequestId
        where
            F: FnOnce(CompletionResult) + Send + 'static,
        {
            self.request($verb, path, parameters, completion)
        }

        #[doc = concat!("Answer ", $name, " requests to `path` with `response` and status 200.")]
        pub fn $fake(&self, path: &str, response: Value) {
            self.fake($verb, path, response, 200);
        }

        #[doc = concat!("Answer ", $name, " requests to `path` with `response` and `status_code`.")]
        pub fn $fake_status(&self, path: &str, response: Value, status_code: u16) {
            self.fake($verb, path, response, status_code);
        }

        #[doc = concat!("Answer ", $name, " requests to `path` with the JSON in `file_name`.")]
        pub fn $fake_file(&self, path: &str, file_name: &str, locator: &FixtureLocator) {
            self.fake_from_file($verb, path, file_name, locator);
        }

        #[doc = concat!("Cancel every pending ", $name, " request to `path`.")]
        pub fn $cancel(&self, path: &str) -> usize {
            self.cancel_path($verb, path)
        }
    };
}

impl Networking {
    verb_methods!(Verb::Get, "GET", get, get_with, fake_get, fake_get_status, fake_get_file, cancel_get);
    verb_methods!(Verb::Post, "POST", post, post_with, fake_post, fake_post_status, fake_post_file, cancel_post);
    verb_methods!(Verb::Put, "PUT", put, put_with, fake_put, fake_put_status, fake_put_file, cancel_put);
    verb_methods!(
        Verb::Patch,
        "PATCH",
        patch,
        patch_with,
        fake_patch,
        fake_patch_status,
        fake_patch_file,
        cancel_patch
    );
    verb_methods!(
        Verb::Delete,
        "DELETE",
        delete,
        delete_with,
        fake_delete,
        fake_delete_status,
        fake_delete_file,
        cancel_delete
    );
}
