pub mod authors;
pub mod books;
pub mod system;

pub use authors::*;
pub use books::*;
pub use system::*;
