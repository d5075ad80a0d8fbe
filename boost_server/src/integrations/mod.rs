pub mod paygate;
