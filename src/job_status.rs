use std::fmt;

/// Classified result of a job, stripped of its running state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    Failure,
    Other,
    Unknown,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match *self {
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
            JobStatus::Other => "other",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

const ANIME_SUFFIX: &str = "_anime";

/// A decoded Jenkins ball color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallColor {
    pub status: JobStatus,
    /// `None` when Jenkins sent no color at all.
    pub is_building: Option<bool>,
}

impl BallColor {
    pub fn decode(color: Option<&str>) -> BallColor {
        let raw = match color {
            Some(raw) => raw.trim().to_ascii_lowercase(),
            None => {
                return BallColor {
                    status: JobStatus::Unknown,
                    is_building: None,
                }
            }
        };

        let (base, is_building) = if raw.ends_with(ANIME_SUFFIX) {
            (&raw[..raw.len() - ANIME_SUFFIX.len()], true)
        } else {
            (raw.as_str(), false)
        };

        let status = match base {
            "blue" | "green" => JobStatus::Success,
            "red" => JobStatus::Failure,
            "yellow" | "aborted" | "disabled" | "grey" | "notbuilt" => JobStatus::Other,
            _ => JobStatus::Unknown,
        };

        BallColor {
            status,
            is_building: Some(is_building),
        }
    }
}
