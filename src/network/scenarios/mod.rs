pub mod factory;
pub mod shared_connection;
pub mod three_friends;
