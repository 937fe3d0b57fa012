/// One line of input, split into tokens. Dropped once dispatch returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommandLine {
    pub tokens: Vec<String>,
}

impl CommandLine {
    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(|s| s.as_str())
    }
}

// What an external command line turns into once the operators are found.
#[derive(Debug, Clone, PartialEq)]
pub enum Launch {
    // "ls -l"
    Direct(Vec<String>),
    // "sort < input.txt", "echo hi > out.txt"
    Redirect {
        argv: Vec<String>,
        mode: RedirectMode,
        target: String,
    },
    // "printf a\nb | wc -l"
    Pipeline {
        left: Vec<String>,
        right: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Input,     // <
    Overwrite, // >
}

impl RedirectMode {
    pub fn operator(self) -> &'static str {
        match self {
            RedirectMode::Input => "<",
            RedirectMode::Overwrite => ">",
        }
    }
}
