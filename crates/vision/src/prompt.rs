use crate::types::SimulationRequest;

/// Instructions sent alongside the two reference images. A per-product
/// custom prompt replaces this wholesale.
pub fn default_prompt(paver_style: &str) -> String {
    format!(
        "Transform this image by applying the {paver_style} paving to the ground surface of \
the outdoor area.\n\
INSTRUCTIONS:\n\
- Replace ONLY the ground/floor surface with the {paver_style} paver pattern shown in the \
reference texture.\n\
- Keep EXACTLY the same perspective, lighting, and realistic shadows as the original scene.\n\
- Do NOT alter any other element (furniture, walls, plants, pools, structures).\n\
- Make the paver installation look professional and natural.\n\
- The pavers must follow the contours and angles of the existing floor.\n\
- Preserve natural shadows and reflections.\n\n\
IMPORTANT: GENERATE AN IMAGE. DO NOT RETURN ONLY TEXT DESCRIBING THE IMAGE.\n"
    )
}

pub fn build_prompt(request: &SimulationRequest) -> String {
    match &request.custom_prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt.clone(),
        _ => default_prompt(&request.paver_style),
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{InlineImage, SimulationRequest};

    use super::build_prompt;

    fn request(custom_prompt: Option<&str>) -> SimulationRequest {
        SimulationRequest {
            original_image: InlineImage::new("image/jpeg", "AAAA"),
            paver_style: "Union - Gray".to_string(),
            paver_texture: "https://textures.example/union-gray.jpg".to_string(),
            custom_prompt: custom_prompt.map(str::to_string),
        }
    }

    #[test]
    fn default_prompt_names_the_style_and_demands_an_image() {
        let prompt = build_prompt(&request(None));
        assert!(prompt.contains("Union - Gray"));
        assert!(prompt.contains("GENERATE AN IMAGE"));
    }

    #[test]
    fn custom_prompt_wins_unless_blank() {
        assert_eq!(build_prompt(&request(Some("paint it gold"))), "paint it gold");
        assert!(build_prompt(&request(Some("   "))).contains("Union - Gray"));
    }
}
