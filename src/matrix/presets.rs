use crate::models::StyleDescriptor;

const PRESETS: [(&str, &str, &str); 10] = [
    ("universal", "Universal game", "game asset style, high quality, detailed"),
    ("wuxia", "Wuxia", "Chinese wuxia/xianxia style, ink painting, ethereal"),
    ("cyberpunk", "Cyberpunk", "cyberpunk style, neon lights, high tech, futuristic"),
    ("pixel", "Pixel art", "pixel art style, 8-bit, retro game"),
    ("casual", "Casual cartoon", "cartoon style, casual game, bright colors, cute"),
    ("dark-fantasy", "Dark fantasy", "dark fantasy style, grim, gothic, detailed"),
    ("realistic", "Realistic 3D", "realistic 3D render, unreal engine 5, 4k"),
    ("anime", "Anime", "anime style, cel shading, vibrant colors, Japanese illustration"),
    ("watercolor", "Watercolor", "watercolor painting style, soft edges, artistic, hand-painted"),
    ("minimalist", "Minimalist flat", "minimalist flat design, clean lines, simple shapes, modern"),
];

/// The built-in style rows, in display order.
pub fn preset_styles() -> Vec<StyleDescriptor> {
    PRESETS
        .iter()
        .map(|(id, name, prompt)| StyleDescriptor::new(*id, *name, *prompt))
        .collect()
}

pub fn style_by_id(id: &str) -> Option<StyleDescriptor> {
    PRESETS
        .iter()
        .find(|(preset_id, _, _)| *preset_id == id)
        .map(|(id, name, prompt)| StyleDescriptor::new(*id, *name, *prompt))
}

/// Looks each id up among the presets. Unknown ids become ad-hoc styles
/// whose name and prompt are the id itself.
pub fn resolve_styles<S: AsRef<str>>(ids: &[S]) -> Vec<StyleDescriptor> {
    ids.iter()
        .map(|id| {
            let id = id.as_ref();
            style_by_id(id).unwrap_or_else(|| StyleDescriptor::new(id, id, id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_presets_with_unique_ids() {
        let styles = preset_styles();
        assert_eq!(styles.len(), 10);
        let mut ids: Vec<_> = styles.iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn lookup_by_id() {
        let pixel = style_by_id("pixel").unwrap();
        assert_eq!(pixel.prompt, "pixel art style, 8-bit, retro game");
        assert!(style_by_id("vaporwave").is_none());
    }

    #[test]
    fn unknown_ids_become_ad_hoc_styles() {
        let styles = resolve_styles(&["anime", "stained glass"]);
        assert_eq!(styles[0].name, "Anime");
        assert_eq!(styles[1], StyleDescriptor::new("stained glass", "stained glass", "stained glass"));
    }
}
