use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Destination network for a bridge order. The source is always Arbitrum Sepolia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Route {
    Base,
    Blast,
    Optimism,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Base, Route::Blast, Route::Optimism];

    /// Key the user types in the interactive menu.
    pub fn menu_key(self) -> &'static str {
        match self {
            Route::Base => "1",
            Route::Blast => "2",
            Route::Optimism => "3",
        }
    }

    pub fn from_menu_key(key: &str) -> Option<Route> {
        Route::ALL.into_iter().find(|r| r.menu_key() == key.trim())
    }

    /// Short name used in success messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Route::Base => "Base",
            Route::Blast => "Blast",
            Route::Optimism => "OP",
        }
    }

    pub fn network_name(self) -> &'static str {
        match self {
            Route::Base => "Base Sepolia",
            Route::Blast => "Blast Sepolia",
            Route::Optimism => "Optimism Sepolia",
        }
    }

    /// Chain code understood by the bridge (pricer `toChain` and order destination).
    pub fn chain_code(self) -> &'static str {
        match self {
            Route::Base => "bssp",
            Route::Blast => "blss",
            Route::Optimism => "opsp",
        }
    }

    pub fn destination_id(self) -> [u8; 4] {
        let mut id = [0u8; 4];
        id.copy_from_slice(self.chain_code().as_bytes());
        id
    }

    pub fn from_destination_id(id: &[u8]) -> Option<Route> {
        Route::ALL
            .into_iter()
            .find(|r| r.chain_code().as_bytes() == id)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arbitrum Sepolia to {}", self.network_name())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(route) = Route::from_menu_key(s) {
            return Ok(route);
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "base" | "bssp" => Ok(Route::Base),
            "blast" | "blss" => Ok(Route::Blast),
            "optimism" | "op" | "opsp" => Ok(Route::Optimism),
            other => Err(format!("unknown route: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_keys_map_to_routes() {
        assert_eq!(Route::from_menu_key("1"), Some(Route::Base));
        assert_eq!(Route::from_menu_key(" 2\n"), Some(Route::Blast));
        assert_eq!(Route::from_menu_key("3"), Some(Route::Optimism));
        assert_eq!(Route::from_menu_key("4"), None);
        assert_eq!(Route::from_menu_key(""), None);
    }

    #[test]
    fn destination_ids_are_ascii_chain_codes() {
        assert_eq!(Route::Base.destination_id(), *b"bssp");
        assert_eq!(Route::Blast.destination_id(), *b"blss");
        assert_eq!(Route::Optimism.destination_id(), *b"opsp");
        for route in Route::ALL {
            assert_eq!(Route::from_destination_id(&route.destination_id()), Some(route));
        }
        assert_eq!(Route::from_destination_id(b"arbt"), None);
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("optimism".parse::<Route>().unwrap(), Route::Optimism);
        assert_eq!("OP".parse::<Route>().unwrap(), Route::Optimism);
        assert_eq!("blss".parse::<Route>().unwrap(), Route::Blast);
        assert_eq!("1".parse::<Route>().unwrap(), Route::Base);
        assert!("polygon".parse::<Route>().is_err());
    }

    #[test]
    fn display_names_match_success_messages() {
        assert_eq!(Route::Base.display_name(), "Base");
        assert_eq!(Route::Optimism.display_name(), "OP");
        assert_eq!(Route::Blast.to_string(), "Arbitrum Sepolia to Blast Sepolia");
    }
}
