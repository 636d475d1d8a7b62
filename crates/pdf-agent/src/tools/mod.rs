//! Tools available to the agents

pub mod math;
pub mod mock_search;
pub mod pdf_qa;
pub mod web_search;

pub use math::{AddTool, MultiplyTool};
pub use mock_search::{MockWebSearchTool, MOCK_SEARCH_RESULT};
pub use pdf_qa::{PdfQaTool, RetrieverSlot};
pub use web_search::WebSearchTool;
