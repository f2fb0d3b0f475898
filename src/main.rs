use openparquet_prefs::config::Config;
use openparquet_prefs::{JsonFileStore, PreferenceStore, Theme};

const USAGE: &str = "usage: openparquet-prefs [theme <light|dark> | add <path>]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::load()?;
    let preferences = PreferenceStore::new(JsonFileStore::open(config.preferences_path()));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] => {}
        ["theme", value] => preferences.set_theme(value.parse::<Theme>()?),
        ["add", path] => preferences.add_recent_file(path),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    println!("Data directory: {}", config.data_dir().display());
    println!("Preferences file: {}", config.preferences_path().display());
    match preferences.theme() {
        Some(theme) => println!("  Theme: {}", theme),
        None => println!("  Theme: (not set)"),
    }
    println!("  Recent files:");
    for path in preferences.recent_files() {
        println!("    {}", path);
    }

    preferences.into_inner().close()?;
    Ok(())
}
