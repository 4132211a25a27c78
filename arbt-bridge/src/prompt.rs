//! Interactive questions asked before any work starts.

use crate::route::Route;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Route(Route),
    Exit,
}

/// `"4"` or an empty answer exits, `"1"`..`"3"` pick a route.
pub fn parse_menu_choice(input: &str) -> Option<MenuChoice> {
    let input = input.trim();
    if input.is_empty() || input == "4" {
        return Some(MenuChoice::Exit);
    }
    Route::from_menu_key(input).map(MenuChoice::Route)
}

pub fn menu_text() -> String {
    let mut text = String::from("Choose the network that you want to use 👇\n\n");
    for route in Route::ALL {
        text.push_str(&format!("{}. {}\n", route.menu_key(), route));
    }
    text.push_str("4. Exit\n\nEnter 1, 2, 3, or 4: ");
    text
}

/// Ask for a route until the answer is valid. End of input counts as exit.
pub fn ask_route<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<MenuChoice> {
    loop {
        write!(out, "{}", menu_text())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(MenuChoice::Exit);
        }
        match parse_menu_choice(&line) {
            Some(choice) => return Ok(choice),
            None => writeln!(out, "✗ Invalid choice: {}", line.trim())?,
        }
    }
}

/// Ask for the number of transactions until the answer is an integer. The
/// sign is not checked here. End of input yields 0.
pub fn ask_count<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<i64> {
    loop {
        write!(out, "🔄 How many times you want to swap or bridge? ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(0);
        }
        match line.trim().parse::<i64>() {
            Ok(count) => return Ok(count),
            Err(_) => writeln!(out, "✗ Please enter a whole number.")?,
        }
    }
}

pub fn display_header() {
    println!("========================================");
    println!("   Arbitrum Sepolia bridge bot");
    println!("   {}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!();
}
