//! Icon names to glyphs available in egui's bundled fonts

/// Glyph for an icon name; unknown names use the default cube
pub fn glyph(icon: &str) -> &'static str {
    match icon.trim() {
        "fa-video" => "🎥",
        "fa-circle-dot" => "⏺",
        "fa-microphone-slash" => "🎙",
        "fa-clapperboard" => "🎬",
        "fa-steam" => "🎮",
        "fa-discord" => "💬",
        "fa-play" => "▶",
        "fa-pause" => "⏸",
        "fa-forward-step" => "⏭",
        "fa-backward-step" => "⏮",
        "fa-volume-xmark" => "🔇",
        "fa-copy" => "📋",
        "fa-paste" => "📌",
        "fa-rotate-left" => "↺",
        "fa-lock" => "🔒",
        "fa-list-check" => "☑",
        "fa-terminal" => "🖳",
        "fa-folder-open" => "📂",
        "fa-crop-simple" => "✂",
        "fa-arrow-turn-down" => "↵",
        "fa-star" => "⭐",
        "fa-gear" => "⚙",
        "fa-globe" => "🌐",
        "fa-music" => "🎵",
        "fa-power-off" => "⏻",
        _ => "⬛",
    }
}
