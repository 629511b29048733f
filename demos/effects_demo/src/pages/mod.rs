pub mod demo1;
pub mod demo2;
pub mod demo3;
pub mod demo4;
pub mod demo5;

pub use demo1::Demo1;
pub use demo2::Demo2;
pub use demo3::{Demo3, Timeout};
pub use demo4::Demo4;
pub use demo5::{Demo5, Demo5Result, Demo5WithLoader};
