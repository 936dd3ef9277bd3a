use std::path::PathBuf;

/// Machine-wide application data directory on Windows
#[cfg(windows)]
pub(crate) fn program_data_dir() -> PathBuf {
    std::env::var_os("ProgramData")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"))
}

/// Salt minion id of this machine, used as the first tag path segment
pub(crate) fn minion_id_path() -> PathBuf {
    #[cfg(windows)]
    {
        program_data_dir()
            .join("National Instruments")
            .join("salt")
            .join("conf")
            .join("minion_id")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/etc/salt/minion_id")
    }
}

/// HTTP configuration that SystemLink writes for the local web server
pub(crate) fn localhost_http_configuration_path() -> PathBuf {
    #[cfg(windows)]
    {
        program_data_dir()
            .join("National Instruments")
            .join("Skyline")
            .join("HttpConfigurations")
            .join("http_localhost.json")
    }
    #[cfg(not(windows))]
    {
        PathBuf::from("/etc/natinst/niskyline/HttpConfigurations/http_localhost.json")
    }
}
