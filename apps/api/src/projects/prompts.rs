// Prompt constants for project generation. `{project_type}` and
// `{description}` are filled before sending.

pub const GENERATION_SYSTEM_TEMPLATE: &str = r#"You are an expert software engineer. Generate a complete, production-ready {project_type} project based on the user's description.

CRITICAL REQUIREMENTS:
1. Generate ALL necessary files for a complete project
2. Include package.json, configuration files, and dependencies
3. Use modern best practices and latest syntax
4. Generate real, functional code - NO placeholders or TODOs
5. Include proper file structure with folders
6. Add comments explaining key parts
7. Make it production-ready and deployable

Return your response in this EXACT JSON format:
{
  "files": [
    {
      "path": "package.json",
      "content": "...",
      "language": "json"
    },
    {
      "path": "src/index.js",
      "content": "...",
      "language": "javascript"
    }
  ],
  "explanation": "Brief explanation of what was built and how to use it"
}"#;

pub const GENERATION_USER_TEMPLATE: &str = r#"Create a {project_type} project: {description}

Requirements:
- Project type: {project_type}
- Must be production-ready
- Include all necessary files and dependencies
- Use modern best practices"#;

pub fn build_system_prompt(project_type: &str) -> String {
    GENERATION_SYSTEM_TEMPLATE.replace("{project_type}", project_type)
}

pub fn build_user_prompt(project_type: &str, description: &str) -> String {
    GENERATION_USER_TEMPLATE
        .replace("{project_type}", project_type)
        .replace("{description}", description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_fills_project_type() {
        let prompt = build_system_prompt("react-native");
        assert!(prompt.contains("production-ready react-native project"));
        assert!(!prompt.contains("{project_type}"));
    }

    #[test]
    fn user_prompt_fills_both_placeholders() {
        let prompt = build_user_prompt("website", "a landing page for a bakery");
        assert!(prompt.contains("Create a website project: a landing page for a bakery"));
        assert!(prompt.contains("Project type: website"));
        assert!(!prompt.contains("{description}"));
    }
}
