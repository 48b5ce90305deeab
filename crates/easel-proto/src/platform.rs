//! Per-user paths and discovery of the external programs easel drives.

use std::path::PathBuf;

/// `~/.local/share/easel` on unix, the local app-data dir elsewhere.
/// Holds easel.log.
pub fn data_dir() -> PathBuf {
    #[cfg(unix)]
    let base = dirs::home_dir().map(|h| h.join(".local").join("share"));
    #[cfg(not(unix))]
    let base = dirs::data_local_dir();

    base.unwrap_or_else(std::env::temp_dir).join("easel")
}

/// `~/.config/easel` on unix, the roaming config dir elsewhere.
pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    let base = dirs::home_dir().map(|h| h.join(".config"));
    #[cfg(not(unix))]
    let base = dirs::config_dir();

    base.unwrap_or_else(|| PathBuf::from(".")).join("easel")
}

const MPV: &[&str] = if cfg!(windows) {
    &["mpv.exe", "mpv"]
} else {
    &["mpv"]
};

/// Synthesisers in preference order. `say` ships with macOS.
const SPEECH: &[&str] = if cfg!(windows) {
    &["espeak-ng.exe", "espeak.exe"]
} else if cfg!(target_os = "macos") {
    &["espeak-ng", "espeak", "say"]
} else {
    &["espeak-ng", "espeak"]
};

/// Locate mpv: `MPV_PATH`, then next to the easel binary, then `PATH`.
pub fn find_mpv_binary() -> Option<PathBuf> {
    find_program("MPV_PATH", MPV)
}

/// Locate a speech synthesiser: `EASEL_SPEECH_PATH`, then next to the easel
/// binary, then `PATH`.
pub fn find_speech_binary() -> Option<PathBuf> {
    find_program("EASEL_SPEECH_PATH", SPEECH)
}

fn find_program(env_override: &str, names: &[&str]) -> Option<PathBuf> {
    let from_env = std::env::var_os(env_override)
        .map(PathBuf::from)
        .filter(|p| p.is_file());
    if from_env.is_some() {
        return from_env;
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from));
    let search_path: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();

    // A name earlier in `names` wins over any later one, wherever it lives.
    names.iter().find_map(|name| {
        exe_dir
            .iter()
            .chain(search_path.iter())
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_end_in_app_name() {
        assert!(data_dir().ends_with("easel"));
        assert!(config_dir().ends_with("easel"));
    }

    #[test]
    fn test_missing_program_is_none() {
        assert_eq!(
            find_program("EASEL_TEST_UNSET_OVERRIDE", &["definitely-not-a-real-binary-7f3a"]),
            None
        );
    }
}
