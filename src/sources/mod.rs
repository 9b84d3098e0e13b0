pub mod rss;
pub mod the_information;

pub use rss::RssCollector;
pub use the_information::TheInformationCollector;
