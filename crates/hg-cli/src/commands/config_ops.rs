use std::fs;

use super::die;

pub fn settings_export() {
    print!("{}", hg_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        hg_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: bleu.smoothing={}, decoder.hope_bleu_weight={}, decoder.fear_bleu_weight={}",
        s.bleu.smoothing, s.decoder.hope_bleu_weight, s.decoder.fear_bleu_weight
    );
}

/// Install a custom settings file before anything reads the settings.
pub fn load_config(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    die!(
        hg_core::settings::init_custom(content),
        "Error in {file}: {}"
    );
}
