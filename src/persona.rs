//! Persona text sent ahead of every conversation, and the canned replies
//! shown when the relay cannot produce one.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use std::path::Path;

const PREAMBLE_TEMPLATE: &str = r#"IMPORTANT: You ARE {{ name }}. You must always speak in first-person ("I", "my", "me"). Never refer to "{{ first_name }}" in third-person.
CURRENT DATE: {{ date }} - Always use this exact date when discussing the current date/year.

Example responses:
Q: "Where do you live?"
A: "I live in {{ location }}"

Q: "What's your background?"
A: "I'm a {{ role }}{% if headline %} with experience in {{ headline }}{% endif %}"

Q: "How old are you?"
A: "I'm {{ age }} years old"

Core details about me:
- I'm {{ age }} years old
- I live in {{ location }}
- I'm a {{ role }}
- My email is {{ email }}
- I was born in {{ birth_year }}
- I was born in {{ birthplace }}
- I have a {{ degree }}

My technical expertise:
{% for skill in skills -%}
- {{ skill }}
{% endfor %}
Response rules:
1. ALWAYS use first-person (I, me, my)
2. Never say "{{ first_name }}" or refer to myself in third-person
3. Keep responses concise and professional
4. Use markdown formatting when appropriate
5. Maintain a friendly, conversational tone

If a question is unrelated to my work or portfolio, say: "{{ deflection }}""#;

const WELCOME_TEMPLATE: &str = r#"Welcome to My Portfolio

Name: {{ name }}
Age: {{ age }}
Role: {{ role }}
Location: {{ location | upper }}

Contact: {{ email }}
GitHub: {{ github }}
LinkedIn: {{ linkedin }}

Ask me anything!
"#;

/// Identity facts the persona speaks from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub age: u32,
    pub role: String,
    pub location: String,
    pub email: String,
    pub github: String,
    pub linkedin: String,
    pub birth_year: u32,
    pub birthplace: String,
    pub degree: String,
    /// Label shown in the terminal title bar.
    pub site: String,
    /// Short skills phrase for the example background answer. Derived
    /// from the first few skills when absent.
    #[serde(default)]
    pub headline: Option<String>,
    pub skills: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        let skills = [
            "Backend Development",
            "Java, Python, Kotlin, C++",
            "PostgreSQL, MySQL, MongoDB",
            "Spring Boot, Express.js",
            "REST APIs, GraphQL",
            "AWS, Docker, Kubernetes",
            "CI/CD, Git",
            "Agile/Scrum methodologies",
            "Problem-solving",
            "Data Structures and Algorithms",
            "System Design",
            "Cloud Computing",
            "Microservices Architecture",
            "Software Development Life Cycle (SDLC)",
            "Object-Oriented Programming (OOP)",
            "Test-Driven Development (TDD)",
            "Version Control (Git)",
            "Continuous Integration/Continuous Deployment (CI/CD)",
            "Agile Methodologies",
            "Web Development (HTML, CSS, JavaScript)",
        ];

        Self {
            name: "Arun Tej".to_string(),
            age: 26,
            role: "Backend Developer".to_string(),
            location: "Tempe, AZ".to_string(),
            email: "agnolas1@asu.edu".to_string(),
            github: "github.com/arun-tej".to_string(),
            linkedin: "linkedin.com/in/chowdaryarun".to_string(),
            birth_year: 1999,
            birthplace: "India".to_string(),
            degree: "Bachelor's degree in Computer Science".to_string(),
            site: "Arun tej.com".to_string(),
            headline: Some("JAVA, Python, and spring boot".to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Profile {
    /// Reads a profile from a JSON file. Fields absent from the file keep
    /// their built-in values.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse profile {}", path.display()))
    }

    /// Loads `path` if given, otherwise the built-in profile.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Phrase completing "experience in ...". Empty when there are no skills.
    pub fn headline(&self) -> String {
        match &self.headline {
            Some(h) => h.clone(),
            None => join_phrase(&self.skills[..self.skills.len().min(3)]),
        }
    }

    /// Prompt shown before the input field.
    pub fn prompt_label(&self) -> String {
        format!("{} root %", self.email)
    }
}

/// "A", "A and B", "A, B, and C".
fn join_phrase(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// "Month Day, Year", e.g. "October 18, 2026".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

pub fn deflection_message(profile: &Profile) -> String {
    format!(
        "That's outside my area of expertise. Feel free to email me at {} and we can discuss further!",
        profile.email
    )
}

pub fn fallback_message(profile: &Profile) -> String {
    format!(
        "I'm having trouble processing that. Please email me at {}",
        profile.email
    )
}

pub fn quota_message(profile: &Profile) -> String {
    format!(
        "I'm currently unavailable due to API usage limits. Please try again later or contact me directly at {}.",
        profile.email
    )
}

/// Renders the system instruction for `profile` as of `date`.
///
/// Has no side effects; callers decide which date counts as "today".
pub fn build_persona_preamble(profile: &Profile, date: NaiveDate) -> Result<String> {
    render(
        "preamble",
        PREAMBLE_TEMPLATE,
        context! {
            name => &profile.name,
            first_name => profile.first_name(),
            date => format_date(date),
            location => &profile.location,
            role => &profile.role,
            headline => profile.headline(),
            age => profile.age,
            email => &profile.email,
            birth_year => profile.birth_year,
            birthplace => &profile.birthplace,
            degree => &profile.degree,
            skills => &profile.skills,
            deflection => deflection_message(profile),
        },
    )
}

pub fn welcome_message(profile: &Profile) -> Result<String> {
    render(
        "welcome",
        WELCOME_TEMPLATE,
        context! {
            name => &profile.name,
            age => profile.age,
            role => &profile.role,
            location => &profile.location,
            email => &profile.email,
            github => &profile.github,
            linkedin => &profile.linkedin,
        },
    )
}

fn render(name: &str, source: &str, ctx: minijinja::Value) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.add_template(name, source)
        .with_context(|| format!("Invalid {} template", name))?;
    let tmpl = env.get_template(name)?;
    tmpl.render(ctx)
        .with_context(|| format!("Failed to render {} template", name))
}
