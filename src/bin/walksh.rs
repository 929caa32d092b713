// walksh: Graph-Walk shell (optional CLI)
// Build with: cargo build --features cli --bin walksh
//
// Edits the persisted walk and prints the queries the stepper would send,
// for pasting into a database console. It never connects to a database.

use clap::{Arg, ArgAction, ArgMatches, Command};

use graph_walk::gql::builders::{CompiledQuery, QueryBuilder};
use graph_walk::persistence::settings::WalkSettings;
use graph_walk::persistence::store::FileStore;
use graph_walk::walk::machine::WalkMachine;
use graph_walk::walk::model::{CandidateSelection, Direction, NodePick, PropertySelection, RelationshipPick, Step};

fn filter_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).value_name("KEY=VALUE").action(ArgAction::Append).help(help)
}

fn parse_filters(matches: &ArgMatches, name: &str) -> Result<Vec<PropertySelection>, String> {
    let Some(values) = matches.get_many::<String>(name) else { return Ok(Vec::new()) };
    values
        .map(|raw| {
            let (k, v) = raw
                .split_once('=')
                .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
            PropertySelection::new(k.trim(), v.trim()).map_err(|e| e.to_string())
        })
        .collect()
}

fn print_query(q: &CompiledQuery) {
    println!("{} (timeout {} ms):\n  {}", q.kind, q.timeout.as_millis(), q.text);
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    // clap enforces `.required(true)` before we get here
    matches.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn main() {
    env_logger::init();

    let matches = Command::new("walksh")
        .about("Graph-Walk Shell: edit the saved walk and print the Cypher it compiles to")
        .arg(Arg::new("store_dir").long("store-dir").value_name("DIR").help("Directory holding the saved walk"))
        .subcommand_required(true)
        .subcommand(Command::new("show").about("Print the saved walk and the next-labels query"))
        .subcommand(
            Command::new("push")
                .about("Append a step to the walk")
                .arg(Arg::new("label").long("label").required(true).help("Label of the node the hop starts from"))
                .arg(Arg::new("type").long("type").required(true).help("Relationship type"))
                .arg(Arg::new("inbound").long("inbound").action(ArgAction::SetTrue).help("Follow the relationship against its direction"))
                .arg(filter_arg("node-filter", "Property filter on the origin node"))
                .arg(filter_arg("rel-filter", "Property filter on the relationship")),
        )
        .subcommand(
            Command::new("pop")
                .about("Remove the step at INDEX and everything after it")
                .arg(Arg::new("index").required(true).value_parser(clap::value_parser!(usize))),
        )
        .subcommand(Command::new("clear").about("Remove every step"))
        .subcommand(
            Command::new("queries")
                .about("Print the stepper queries for a focal label")
                .arg(Arg::new("label").long("label").required(true))
                .arg(filter_arg("filter", "Property filter on the focal node"))
                .arg(Arg::new("property").long("property").value_name("NAME").help("Also print the value-count query for this property")),
        )
        .subcommand(Command::new("overview").about("Print the whole-graph label and relationship type queries"))
        .get_matches();

    let settings = WalkSettings::load().unwrap_or_else(|e| {
        eprintln!("[Graph-Walk] could not read settings from {}: {}", WalkSettings::settings_dir().display(), e);
        WalkSettings::default()
    });
    let store = match matches.get_one::<String>("store_dir") {
        Some(dir) => FileStore::new(dir),
        None => FileStore::from_settings(&settings),
    };
    let builder = QueryBuilder::from_settings(&settings);
    let mut machine = WalkMachine::open(store);

    let outcome = match matches.subcommand() {
        Some(("show", _)) => {
            if machine.walk().is_empty() {
                println!("(empty walk)");
            }
            for (idx, step) in machine.walk().iter().enumerate() {
                println!("{:>3}  {}", idx, step);
            }
            print_query(&builder.reachable_labels(machine.walk()));
            Ok(())
        }
        Some(("push", sub)) => push(&mut machine, sub),
        Some(("pop", sub)) => {
            let index = sub.get_one::<usize>("index").copied().unwrap_or_default();
            machine.truncate(index);
            println!("walk now has {} step(s)", machine.walk().len());
            Ok(())
        }
        Some(("clear", _)) => {
            machine.clear();
            println!("walk cleared");
            Ok(())
        }
        Some(("queries", sub)) => parse_filters(sub, "filter").map(|filters| {
            let candidate = filters
                .into_iter()
                .fold(CandidateSelection::new(required(sub, "label")), |c, f| c.with_filter(f));
            let walk = machine.walk();
            for q in [builder.adjacent_relationships(walk, &candidate), builder.property_key_counts(walk, &candidate)]
                .into_iter()
                .flatten()
            {
                print_query(&q);
            }
            if let Some(prop) = sub.get_one::<String>("property")
                && let Some(q) = builder.property_value_counts(walk, &candidate, prop)
            {
                print_query(&q);
            }
        }),
        Some(("overview", _)) => {
            print_query(&builder.all_labels());
            print_query(&builder.all_relationship_types());
            Ok(())
        }
        _ => Ok(()),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn push(machine: &mut WalkMachine<FileStore>, sub: &ArgMatches) -> Result<(), String> {
    let node_filters = parse_filters(sub, "node-filter")?;
    let rel_filters = parse_filters(sub, "rel-filter")?;
    let origin = NodePick::new(required(sub, "label"), node_filters).map_err(|e| e.to_string())?;
    let rel = RelationshipPick::new(required(sub, "type"), rel_filters).map_err(|e| e.to_string())?;
    let direction = if sub.get_flag("inbound") { Direction::Inbound } else { Direction::Outbound };
    machine.append(Step::new(origin, rel, direction));
    println!("walk now has {} step(s)", machine.walk().len());
    Ok(())
}
