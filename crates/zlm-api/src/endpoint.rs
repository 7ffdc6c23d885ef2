//! Administrative API endpoints scraped by the exporter.

use strum::{Display, EnumIter, IntoStaticStr};

/// One remote data feed of the media server.
///
/// The string form is the endpoint path relative to the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr)]
pub enum Endpoint {
    #[strum(serialize = "index/api/version")]
    Version,
    #[strum(serialize = "index/api/getApiList")]
    ApiList,
    #[strum(serialize = "index/api/getThreadsLoad")]
    NetworkThreads,
    #[strum(serialize = "index/api/getWorkThreadsLoad")]
    WorkThreads,
    #[strum(serialize = "index/api/getStatistic")]
    Statistics,
    #[strum(serialize = "index/api/getAllSession")]
    Sessions,
    #[strum(serialize = "index/api/getMediaList")]
    MediaList,
    #[strum(serialize = "index/api/listRtpServer")]
    RtpServers,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        self.into()
    }
}
