pub mod layout;
mod reader;
mod section;

pub use layout::VmLayout;
pub use reader::{ReadMemory, StaticBlob};
pub use section::{MemorySection, SectionIndex};
