use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    sourcemark completions bash > ~/.bash_completion.d/sourcemark\n\n\
                  Generate zsh completions:\n    sourcemark completions zsh > ~/.zfunc/_sourcemark\n\n\
                  Generate fish completions:\n    sourcemark completions fish > ~/.config/fish/completions/sourcemark.fish\n\n\
                  Generate PowerShell completions:\n    sourcemark completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
