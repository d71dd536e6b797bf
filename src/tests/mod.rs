#[cfg(test)]
mod common;

#[cfg(test)]
mod scenario_test;
