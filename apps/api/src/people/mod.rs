// Case-file intake, search and maintenance.

pub mod age;
pub mod handlers;
pub mod search;
pub mod validation;

#[cfg(test)]
pub mod test_support;
