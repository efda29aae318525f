use thiserror::Error;

/// Load-phase configuration errors. A dataset that trips one of these
/// cannot be trusted, so the load phase aborts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    #[error("Stop {name:?} is already in the catalogue")]
    DuplicateStop { name: String },

    #[error("Line {name:?} is already in the catalogue")]
    DuplicateLine { name: String },

    #[error("No such Stop {stop:?} on Line {line:?}")]
    NoStopOnLine { stop: String, line: String },

    #[error("No such Stop {stop:?}")]
    UnknownStop { stop: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Routing settings must be set before edges are added or the graph is built")]
    SettingsMissing,

    #[error("Routing settings are immutable once set")]
    SettingsAlreadySet,

    #[error("No such Stop {stop:?} registered with the router")]
    UnknownStop { stop: String },

    #[error("The router has no stops to build a graph from")]
    NoStops,

    #[error("The router is already built; no further mutation is allowed")]
    AlreadyBuilt,

    #[error("The router must be built before it can answer route queries")]
    NotBuilt,
}

/// Errors raised by the JSON request layer and the snapshot codec.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Malformed request document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request document is missing the {section:?} section")]
    MissingSection { section: &'static str },

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    #[error(transparent)]
    Router(#[from] RouterError),
}
