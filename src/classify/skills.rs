//! Skill extraction from repository metadata
//!
//! Languages come from each repository's primary language and from the
//! language breakdowns of the most-starred repositories. Frameworks and tools
//! are detected by keyword in repository names and descriptions.

use crate::api::{LanguageBreakdown, Repository};
use std::collections::HashMap;

/// Display names that title-casing would get wrong
const CANONICAL_NAMES: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("coffeescript", "CoffeeScript"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("f#", "F#"),
    ("php", "PHP"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("sql", "SQL"),
    ("tsql", "TSQL"),
    ("plpgsql", "PLpgSQL"),
    ("objective-c", "Objective-C"),
    ("objective-c++", "Objective-C++"),
    ("powershell", "PowerShell"),
    ("matlab", "MATLAB"),
    ("ocaml", "OCaml"),
    ("webassembly", "WebAssembly"),
    ("graphql", "GraphQL"),
    ("hcl", "HCL"),
    ("cmake", "CMake"),
    ("glsl", "GLSL"),
    ("hlsl", "HLSL"),
    ("vhdl", "VHDL"),
    ("scala", "Scala"),
    ("vim script", "Vim Script"),
];

struct Framework {
    key: &'static str,
    display: &'static str,

    /// Whole-token patterns; multi-word patterns match consecutive tokens
    patterns: &'static [&'static str],
}

const FRAMEWORKS: &[Framework] = &[
    Framework { key: "react", display: "React", patterns: &["react", "reactjs", "react.js"] },
    Framework { key: "vue", display: "Vue.js", patterns: &["vue", "vuejs", "vue.js", "nuxt", "nuxtjs"] },
    Framework { key: "angular", display: "Angular", patterns: &["angular", "angularjs"] },
    Framework { key: "svelte", display: "Svelte", patterns: &["svelte", "sveltekit"] },
    Framework { key: "next.js", display: "Next.js", patterns: &["nextjs", "next.js"] },
    Framework { key: "django", display: "Django", patterns: &["django"] },
    Framework { key: "flask", display: "Flask", patterns: &["flask"] },
    Framework { key: "fastapi", display: "FastAPI", patterns: &["fastapi"] },
    Framework { key: "express", display: "Express", patterns: &["expressjs", "express.js"] },
    Framework { key: "nestjs", display: "NestJS", patterns: &["nestjs", "nest.js"] },
    Framework { key: "spring", display: "Spring", patterns: &["springboot", "spring boot", "spring framework"] },
    Framework { key: "rails", display: "Rails", patterns: &["rails", "ruby on rails"] },
    Framework { key: "laravel", display: "Laravel", patterns: &["laravel"] },
    Framework { key: "postgresql", display: "PostgreSQL", patterns: &["postgresql", "postgres"] },
    Framework { key: "mysql", display: "MySQL", patterns: &["mysql", "mariadb"] },
    Framework { key: "mongodb", display: "MongoDB", patterns: &["mongodb", "mongo", "mongoose"] },
    Framework { key: "redis", display: "Redis", patterns: &["redis"] },
    Framework { key: "graphql", display: "GraphQL", patterns: &["graphql"] },
    Framework { key: "docker", display: "Docker", patterns: &["docker", "docker compose"] },
    Framework { key: "kubernetes", display: "Kubernetes", patterns: &["kubernetes", "k8s", "kubectl"] },
    Framework { key: "terraform", display: "Terraform", patterns: &["terraform"] },
    Framework { key: "aws", display: "AWS", patterns: &["aws", "ec2", "cloudformation"] },
    Framework { key: "azure", display: "Azure", patterns: &["azure"] },
    Framework { key: "gcp", display: "GCP", patterns: &["gcp", "google cloud"] },
    Framework { key: "tensorflow", display: "TensorFlow", patterns: &["tensorflow", "keras"] },
    Framework { key: "pytorch", display: "PyTorch", patterns: &["pytorch", "torch"] },
    Framework { key: "pandas", display: "pandas", patterns: &["pandas"] },
];

/// Display name for a language or tool token
///
/// `"javascript"` becomes `"JavaScript"`; names without a canonical spelling
/// are title-cased word by word (`"jupyter notebook"` becomes
/// `"Jupyter Notebook"`).
pub fn display_name(token: &str) -> String {
    let key = token.trim().to_lowercase();
    if let Some((_, canonical)) = CANONICAL_NAMES.iter().find(|(k, _)| *k == key) {
        return (*canonical).to_string();
    }
    key.split(' ')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encounter counts that remember first-seen order
#[derive(Debug, Default)]
pub struct SkillTally {
    entries: Vec<(String, String, u32)>,
    index: HashMap<String, usize>,
}

impl SkillTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one encounter of `token` under its case-folded key
    pub fn record(&mut self, token: &str) {
        let key = token.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        self.record_keyed(key, || display_name(token));
    }

    fn record_keyed(&mut self, key: String, display: impl FnOnce() -> String) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].2 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, display(), 1));
            }
        }
    }

    pub fn count(&self, token: &str) -> u32 {
        let key = token.trim().to_lowercase();
        self.index.get(&key).map_or(0, |&i| self.entries[i].2)
    }

    /// `(key, display)` pairs, most frequent first, ties in first-seen order
    pub fn ranked(&self) -> Vec<(&str, &str)> {
        let mut ranked: Vec<&(String, String, u32)> = self.entries.iter().collect();
        // sort_by is stable, so equal counts keep insertion order
        ranked.sort_by(|a, b| b.2.cmp(&a.2));
        ranked
            .into_iter()
            .map(|(key, display, _)| (key.as_str(), display.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits free text into lowercase tokens, keeping `.`, `+` and `#` inside words
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '+' | '#')))
        .map(|token| token.trim_matches('.'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_pattern(tokens: &[String], pattern: &str) -> bool {
    let words: Vec<&str> = pattern.split(' ').collect();
    if words.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t == w))
}

/// Frameworks and tools mentioned in `text`, in table order, each at most once
pub fn detect_frameworks(text: &str) -> Vec<(&'static str, &'static str)> {
    let tokens = tokenize(text);
    FRAMEWORKS
        .iter()
        .filter(|fw| fw.patterns.iter().any(|p| matches_pattern(&tokens, p)))
        .map(|fw| (fw.key, fw.display))
        .collect()
}

/// Builds the ordered skill list for one candidate
///
/// Languages come first, ranked by how many repositories and breakdowns
/// mention them, then frameworks detected in repository names and
/// descriptions. Duplicates are dropped by canonical key.
///
/// # Arguments
///
/// * `repos` - The candidate's repositories, in listing order
/// * `breakdowns` - Language breakdowns fetched for the breakdown targets,
///   in the order those targets were chosen
/// * `max_skills` - Upper bound on the returned list
///
/// # Returns
///
/// Display names, most frequent first, at most `max_skills` long
pub fn extract_skills(
    repos: &[Repository],
    breakdowns: &[&LanguageBreakdown],
    max_skills: usize,
) -> Vec<String> {
    let mut languages = SkillTally::new();
    for repo in repos {
        if let Some(language) = repo.language.as_deref() {
            languages.record(language);
        }
    }
    for breakdown in breakdowns {
        for language in breakdown.languages() {
            languages.record(language);
        }
    }

    let mut frameworks = SkillTally::new();
    for repo in repos {
        let text = format!(
            "{} {}",
            repo.name,
            repo.description.as_deref().unwrap_or_default()
        );
        for (key, display) in detect_frameworks(&text) {
            frameworks.record_keyed(key.to_string(), || display.to_string());
        }
    }

    let mut seen = std::collections::HashSet::new();
    languages
        .ranked()
        .into_iter()
        .chain(frameworks.ranked())
        .filter(|(key, _)| seen.insert(key.to_string()))
        .map(|(_, display)| display.to_string())
        .take(max_skills)
        .collect()
}
