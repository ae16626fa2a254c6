use std::rc::Rc;

use anyhow::{Result, anyhow};

use crate::network::common::interface::ScenarioMaker;

use super::{shared_connection::SharedConnection, three_friends::ThreeFriends};

pub struct ScenarioMakerFactory;

impl ScenarioMakerFactory {
    pub const NAMES: [&'static str; 2] = ["three_friends", "shared_connection"];

    pub fn new_shared(name: &str) -> Result<Rc<dyn ScenarioMaker>> {
        match name {
            "three_friends" => Ok(Rc::new(ThreeFriends {})),
            "shared_connection" => Ok(Rc::new(SharedConnection {})),
            _ => Err(anyhow!(
                "Unknown scenario '{}', expected one of {}",
                name,
                Self::NAMES.join(", ")
            )),
        }
    }
}
