use std::path::PathBuf;

const HISTORY_FILE_NAME: &str = ".ideapulse_history.txt";

pub fn history_file() -> Option<PathBuf> {
    let home = shellexpand::path::tilde("~");
    if home.as_os_str() == "~" {
        None
    } else {
        Some(home.join(HISTORY_FILE_NAME))
    }
}
