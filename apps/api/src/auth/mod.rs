// Bearer-token sessions for the single configured caseworker account.

pub mod handlers;
pub mod middleware;
