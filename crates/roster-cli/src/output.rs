//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use roster_core::User;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is in JSON mode
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single user record
    pub fn print_user(&self, user: &User) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", user.id);
                println!("Name:     {}", user.name);
                println!("Username: {}", user.username);
                println!("Email:    {}", user.email);
                println!("Phone:    {}", user.phone);
                if let Some(ref website) = user.website {
                    println!("Website:  {}", website);
                }
                if let Some(company) = user.company_name() {
                    println!("Company:  {}", company);
                }
                if let Some(ref avatar) = user.avatar_url {
                    println!("Avatar:   {} bytes (data URI)", avatar.len());
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(user).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", user.id);
            }
        }
    }

    /// Print a list of users
    pub fn print_users(&self, users: &[User]) {
        match self.format {
            OutputFormat::Human => {
                if users.is_empty() {
                    println!("No users found.");
                    return;
                }
                for user in users {
                    let company = user.company_name().unwrap_or("-");
                    println!(
                        "{:>4} | {} | {} | {}",
                        user.id,
                        truncate(&user.name, 25),
                        truncate(&user.email, 30),
                        truncate(company, 25)
                    );
                }
                println!("\n{} user(s)", users.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(users).unwrap());
            }
            OutputFormat::Quiet => {
                for user in users {
                    println!("{}", user.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", message),
            OutputFormat::Json => {}
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_len - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte_names() {
        // Cutting must never land inside a multibyte character
        assert_eq!(truncate("Bérénice Dupré-Lefèvre", 10), "Bérénic...");
        assert_eq!(truncate("Bérénice", 25), "Bérénice");
    }
}
