// Resume ingestion LLM prompt templates.

pub const SKILL_EXTRACTION_PROMPT: &str = r#"Analyze the following resume text and extract every technical and soft skill it mentions.

Return ONLY a comma-separated list of skills on a single line. Cover:
- Programming languages (Python, JavaScript, Java, ...)
- Frameworks and libraries (React, Django, Flask, ...)
- Platforms and technologies (Docker, AWS, MongoDB, ...)
- Tools (Git, Jenkins, Kubernetes, ...)
- Interpersonal skills (Leadership, Communication, ...)

RESUME TEXT:
{resume_text}

SKILLS (comma-separated):"#;
