//! Human-readable output helpers.

use colored::Colorize;
use pathrules_core::{StructuralProblem, Verdict};

/// Prints the resolved approvers for one path.
pub fn print_owners(path: &str, approvers: &[String], use_colors: bool) {
    if approvers.is_empty() {
        if use_colors {
            println!("{}: {}", path.bold(), "(no approvers)".yellow());
        } else {
            println!("{path}: (no approvers)");
        }
        return;
    }
    let joined = approvers.join(" ");
    if use_colors {
        println!("{}: {}", path.bold(), joined.green());
    } else {
        println!("{path}: {joined}");
    }
}

/// Prints the ignore verdict for one path.
pub fn print_verdict(path: &str, verdict: Verdict, use_colors: bool) {
    let label = match verdict {
        Verdict::Ignored => "ignored",
        Verdict::Kept => "kept",
        Verdict::Abstain => "kept (no match)",
    };
    if use_colors {
        let colored_label = match verdict {
            Verdict::Ignored => label.red(),
            Verdict::Kept => label.green(),
            Verdict::Abstain => label.normal(),
        };
        println!("{}: {}", path.bold(), colored_label);
    } else {
        println!("{path}: {label}");
    }
}

/// Prints one structural problem.
pub fn print_problem(problem: &StructuralProblem, use_colors: bool) {
    if use_colors {
        println!("{} {}", "problem:".yellow().bold(), problem);
    } else {
        println!("problem: {problem}");
    }
}

/// Prints an error message to stderr.
pub fn print_error(message: &str, use_colors: bool) {
    if use_colors {
        eprintln!("{} {}", "error:".red().bold(), message);
    } else {
        eprintln!("error: {message}");
    }
}
