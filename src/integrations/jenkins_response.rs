/// The slice of Jenkins' `job/<name>/api/json` payload the watch poller reads.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LiveJob {
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(rename = "lastBuild", default)]
    pub last_build: Option<BuildRef>,

    #[serde(rename = "lastCompletedBuild", default)]
    pub last_completed_build: Option<BuildRef>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct BuildRef {
    pub number: u64,
    pub url: String,

    #[serde(default)]
    pub building: Option<bool>,

    // SUCCESS, FAILURE, UNSTABLE, ABORTED, NOT_BUILT, or null while running.
    #[serde(default)]
    pub result: Option<String>,
}
