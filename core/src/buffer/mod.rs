pub mod adapter;
pub mod view;

pub use adapter::BufferedChannelAdapter;
pub use view::{split_windows, Backing, ByteView};
