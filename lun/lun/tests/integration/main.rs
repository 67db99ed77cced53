mod binding;
mod cli;
mod parsing;
