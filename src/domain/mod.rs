pub mod assembler;
pub mod cart;
pub mod errors;
pub mod identity;
pub mod money;
pub mod order;
pub mod ports;
pub mod validator;
