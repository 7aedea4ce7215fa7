//! Command line tokenization
//!
//! Best-effort splitting, not a shell grammar:
//! - tokens are runs of non-whitespace characters
//! - a `"..."` or `'...'` span belongs to the surrounding token and may hold whitespace
//! - span delimiters are removed (`--name="a b"` becomes `--name=a b`)
//! - an unterminated quote runs to the end of the line
//! - escapes, nested quotes and operators are not interpreted
//!
//! The line handed to the shell is rebuilt from the tokens. Unquoted tokens are
//! passed verbatim so operators such as `&&` or `|` still reach the shell; tokens
//! that had quoted spans are re-quoted for the target shell.

use bgproc_foundation::{Error, Result};

/// A single token of a command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandToken {
    /// Token text with quote delimiters removed
    pub text: String,

    /// Token exactly as written
    pub raw: String,

    /// Whether the token contained a quoted span
    pub quoted: bool,
}

/// Split a command line into tokens.
pub fn tokenize(line: &str) -> Vec<CommandToken> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut token = CommandToken::default();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                break;
            }
            chars.next();
            token.raw.push(c);

            if c == '"' || c == '\'' {
                token.quoted = true;
                for inner in chars.by_ref() {
                    token.raw.push(inner);
                    if inner == c {
                        break;
                    }
                    token.text.push(inner);
                }
            } else {
                token.text.push(c);
            }
        }
        tokens.push(token);
    }

    tokens
}

/// A tokenized command line with at least one (executable) token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    tokens: Vec<CommandToken>,
}

impl CommandLine {
    /// Tokenize `line`. Fails with [`Error::Spawn`] when there is no executable.
    pub fn parse(line: &str) -> Result<Self> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Err(Error::Spawn(
                "Command string appears empty or invalid".to_string(),
            ));
        }
        Ok(Self { tokens })
    }

    /// Executable token
    pub fn program(&self) -> &str {
        &self.tokens[0].text
    }

    /// Argument tokens
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.tokens[1..].iter().map(|t| t.text.as_str())
    }

    pub fn tokens(&self) -> &[CommandToken] {
        &self.tokens
    }

    /// Rebuild the line for the platform shell.
    pub fn to_shell_line(&self) -> Result<String> {
        let mut parts = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            if !token.quoted {
                parts.push(token.raw.clone());
                continue;
            }
            if token.text.contains('\0') {
                return Err(Error::InvalidInput(
                    "command line contains a NUL byte".to_string(),
                ));
            }
            parts.push(quote_for_shell(&token.text)?);
        }
        Ok(parts.join(" "))
    }
}

#[cfg(not(windows))]
fn quote_for_shell(text: &str) -> Result<String> {
    shlex::try_quote(text)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| Error::InvalidInput(format!("cannot quote argument: {}", e)))
}

#[cfg(windows)]
fn quote_for_shell(text: &str) -> Result<String> {
    // cmd.exe has no escape for an embedded double quote inside "..."
    Ok(format!("\"{}\"", text.replace('"', "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &str) -> Vec<String> {
        tokenize(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_simple_split() {
        assert_eq!(texts("echo hello  world"), vec!["echo", "hello", "world"]);
        assert_eq!(texts("  \t ls\n"), vec!["ls"]);
    }

    #[test]
    fn test_quoted_spans() {
        assert_eq!(
            texts(r#"python "my script.py" -m 'a b'"#),
            vec!["python", "my script.py", "-m", "a b"]
        );
        assert_eq!(texts(r#"--name="a b"c"#), vec!["--name=a bc"]);
        assert_eq!(texts(r#"say "it's""#), vec!["say", "it's"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(texts(r#"echo "abc def"#), vec!["echo", "abc def"]);
    }

    #[test]
    fn test_empty_quotes() {
        let tokens = tokenize(r#"printf """#);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text, "");
        assert!(tokens[1].quoted);
    }

    #[test]
    fn test_parse_requires_executable() {
        assert!(matches!(CommandLine::parse(""), Err(Error::Spawn(_))));
        assert!(matches!(CommandLine::parse("   "), Err(Error::Spawn(_))));

        let cmd = CommandLine::parse("cargo build --release").unwrap();
        assert_eq!(cmd.program(), "cargo");
        assert_eq!(cmd.args().collect::<Vec<_>>(), vec!["build", "--release"]);
    }

    #[test]
    fn test_shell_line_passes_operators() {
        let cmd = CommandLine::parse("cd build && make -j4 | tee log.txt").unwrap();
        assert_eq!(
            cmd.to_shell_line().unwrap(),
            "cd build && make -j4 | tee log.txt"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_line_requotes() {
        let cmd = CommandLine::parse(r#"python "my script.py" --x="a b""#).unwrap();
        let line = cmd.to_shell_line().unwrap();
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec!["python", "my script.py", "--x=a b"]
        );

        let cmd = CommandLine::parse(r#"echo "hello""#).unwrap();
        assert_eq!(cmd.to_shell_line().unwrap(), "echo hello");
    }

    #[test]
    fn test_shell_line_rejects_nul() {
        let cmd = CommandLine::parse("echo \"a\0b\"").unwrap();
        assert!(matches!(cmd.to_shell_line(), Err(Error::InvalidInput(_))));
    }
}
