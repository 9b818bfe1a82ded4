pub mod fixture;
pub mod store;

pub use fixture::FixtureLocator;
pub use store::{FakePayload, FakeResponse, ResponseStore};
