use tickdown_core::sound::{PresetSound, CUSTOM_SOUND_EXTENSIONS};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    for preset in PresetSound::ALL {
        println!("{}", preset.id());
    }
    eprintln!(
        "custom sounds: pass a file path ({})",
        CUSTOM_SOUND_EXTENSIONS.join(", ")
    );
    Ok(())
}
