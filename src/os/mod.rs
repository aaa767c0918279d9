pub mod fifo;
pub mod mock;
pub mod notify;
