use labelguard_core::{AnalysisError, AnalysisRequest, ModelPart, ModelRequest, COMPLIANCE_RULES};

/// MIME type assumed when the uploader did not report one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

const PREAMBLE: &str = "Analyze this product image and perform two tasks:\n\n\
1. Extract all visible text from the product (name, ingredients, warnings, dates, etc.). \
Support multi-language extraction.";

const OUTPUT_FORMAT: &str = r#"Return a JSON object with this exact structure:
{
  "extractedText": "All extracted text here",
  "compliances": [
    {
      "rule": "Rule name",
      "passed": true/false,
      "details": "Brief explanation"
    }
  ]
}

Return ONLY valid JSON, no other text."#;

/// Turn an analysis request into the two-part model request: inline image, then instruction.
pub fn build_request(request: &AnalysisRequest) -> Result<ModelRequest, AnalysisError> {
    if request.image.is_empty() {
        return Err(AnalysisError::InvalidInput("No file provided".to_string()));
    }

    let mime_type = request.mime_type.trim();
    let mime_type = if mime_type.is_empty() {
        DEFAULT_MIME_TYPE
    } else if mime_type.starts_with("image/") {
        mime_type
    } else {
        return Err(AnalysisError::InvalidInput(
            "Only image uploads are supported".to_string(),
        ));
    };

    let instruction = build_instruction(
        request.product_name.as_deref(),
        request.product_description.as_deref(),
    );

    Ok(ModelRequest {
        parts: vec![
            ModelPart::InlineData {
                mime_type: mime_type.to_string(),
                data: request.image.clone(),
            },
            ModelPart::Text(instruction),
        ],
    })
}

/// Deterministic instruction text. Blank product fields count as absent.
pub fn build_instruction(product_name: Option<&str>, product_description: Option<&str>) -> String {
    let name = non_blank(product_name);
    let description = non_blank(product_description);

    let mut prompt = String::from(PREAMBLE);

    if name.is_some() || description.is_some() {
        prompt.push_str("\n\nProduct Context:");
        if let Some(name) = name {
            prompt.push_str(&format!("\n- Product Name: {}", name));
        }
        if let Some(description) = description {
            prompt.push_str(&format!("\n- Description: {}", description));
        }
        prompt.push_str("\n\nUse this context to better understand and validate the product.");
    }

    let rules: Vec<String> = COMPLIANCE_RULES
        .iter()
        .enumerate()
        .map(|(i, rule)| format!("{}. {}", i + 1, rule))
        .collect();

    prompt.push_str("\n\n2. Check compliance with these rules:\n");
    prompt.push_str(&rules.join("\n"));
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_FORMAT);
    prompt
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_image_is_invalid_input() {
        let err = build_request(&AnalysisRequest::new(Vec::new(), "image/png")).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn test_non_image_mime_rejected() {
        let err = build_request(&AnalysisRequest::new(vec![1], "application/pdf")).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[test]
    fn test_parts_order_and_default_mime() {
        let request = build_request(&AnalysisRequest::new(vec![0xFF, 0xD8], "")).unwrap();
        assert_eq!(request.parts.len(), 2);
        assert_eq!(request.inline_data(), Some((DEFAULT_MIME_TYPE, &[0xFF, 0xD8][..])));
        assert!(matches!(request.parts[1], ModelPart::Text(_)));
    }

    #[test]
    fn test_rules_enumerated_in_order() {
        let prompt = build_instruction(None, None);
        assert!(prompt.contains("1. Product name is clearly visible"));
        assert!(prompt.contains("10. Country of origin is specified"));
        let first = prompt.find("1. Product name").unwrap();
        let last = prompt.find("10. Country").unwrap();
        assert!(first < last);
        assert!(prompt.ends_with("Return ONLY valid JSON, no other text."));
    }

    #[test]
    fn test_context_block_only_when_supplied() {
        assert!(!build_instruction(None, None).contains("Product Context"));
        assert!(!build_instruction(Some("  "), Some("")).contains("Product Context"));

        let prompt = build_instruction(Some("Oat Milk"), None);
        assert!(prompt.contains("Product Context:\n- Product Name: Oat Milk"));
        assert!(!prompt.contains("- Description:"));

        let prompt = build_instruction(None, Some("1L carton"));
        assert!(prompt.contains("- Description: 1L carton"));
        assert!(!prompt.contains("- Product Name:"));
    }

    #[test]
    fn test_instruction_is_deterministic() {
        assert_eq!(
            build_instruction(Some("A"), Some("B")),
            build_instruction(Some("A"), Some("B"))
        );
    }
}
