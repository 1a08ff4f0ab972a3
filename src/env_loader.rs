use std::env;
use std::path::PathBuf;

fn fallback_dotenv_path(config_dir: Option<PathBuf>) -> Option<PathBuf> {
    Some(config_dir?.join("paperdeck/.env"))
}

/// Load `.env` from the working directory, falling back to the user config
/// directory. Missing files are fine; env vars already set always win.
pub fn load_dotenv() {
    if env::var_os("PAPERDECK_SKIP_DOTENV").is_some() {
        return;
    }
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let Some(path) = fallback_dotenv_path(dirs::config_dir()) else {
        return;
    };
    if path.is_file() {
        let _ = dotenvy::from_path(&path);
    }
}

#[cfg(test)]
mod tests {
    use super::fallback_dotenv_path;
    use std::path::PathBuf;

    #[test]
    fn fallback_lives_under_the_config_dir() {
        let got = fallback_dotenv_path(Some(PathBuf::from("/home/alice/.config")));
        assert_eq!(got, Some(PathBuf::from("/home/alice/.config/paperdeck/.env")));
    }

    #[test]
    fn no_config_dir_means_no_fallback() {
        assert_eq!(fallback_dotenv_path(None), None);
    }
}
