use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use clap::Parser;
use log::info;

use bdd_reach::config::{BddConfig, LoopDetectionConfig};
use bdd_reach::dot::DotConfig;
use bdd_reach::edge::Edge;
use bdd_reach::header_space::HeaderSpace;
use bdd_reach::packet::{PacketBdd, PacketField};
use bdd_reach::reference::Ref;
use bdd_reach::transition::Transition;
use bdd_reach::{IngressLocation, LoopDetector, ReachabilityAnalysis, State, StateGraph};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Maximum number of hops before a packet in flight is a loop candidate.
    #[arg(long, value_name = "INT", default_value = "256")]
    max_hops: usize,

    /// Graph edges per router hop.
    #[arg(long, value_name = "INT", default_value = "5")]
    steps_per_hop: usize,

    /// Computed table size (in bits, so the actual size is `2^size` entries).
    #[arg(long, value_name = "INT", default_value = "16")]
    cache_bits: usize,

    /// Print the state graph in DOT format, annotated with the reachability result.
    #[arg(long)]
    dot: bool,
}

/// Two routers joined by one link.
///
/// - `r1` hosts 10.1.0.0/16 and source-NATs it to 203.0.113.1 towards `r2`.
/// - `r2` hosts 192.168.0.0/24 and has an inbound ACL that only lets
///   traffic from 203.0.113.1 to TCP port 443 through.
/// - Both routers have a static route for 10.99.0.0/16 pointing at each other.
/// - Everything else is dropped for lack of a route.
fn build_network(packets: &PacketBdd) -> color_eyre::Result<StateGraph<PacketBdd>> {
    let r1_lan = packets.dst_prefix(Ipv4Addr::new(10, 1, 0, 0), 16)?;
    let r2_lan = packets.dst_prefix(Ipv4Addr::new(192, 168, 0, 0), 24)?;
    let bogus = packets.dst_prefix(Ipv4Addr::new(10, 99, 0, 0), 16)?;
    let inside = packets.src_prefix(Ipv4Addr::new(10, 1, 0, 0), 16)?;
    let public = packets.src_prefix(Ipv4Addr::new(203, 0, 113, 1), 32)?;
    let https = packets.intersect(
        &packets.value(PacketField::IpProtocol, 6)?,
        &packets.value(PacketField::DstPort, 443)?,
    );
    let acl = packets.intersect(&public, &https);

    let to_r2 = packets.union(&r2_lan, &bogus);
    let to_r1 = bogus;

    let mut edges = Vec::new();
    for (host, peer, local, remote) in [("r1", "r2", r1_lan, to_r2), ("r2", "r1", r2_lan, to_r1)] {
        let vrf = State::post_in_vrf(host, "default");
        let out = State::pre_out_vrf(host, "default");
        let link = State::pre_out_edge(host, "e0", peer, "e0");
        let link_post_nat = State::pre_out_edge_post_nat(host, "e0", peer, "e0");
        let iface = State::pre_in_interface(host, "e0");
        let no_route = packets.complement(&packets.union_all([&local, &remote]));

        edges.push(Edge::identity(State::originate_vrf(host, "default"), vrf.clone()));
        if host == "r2" {
            edges.push(Edge::constraint(iface.clone(), vrf.clone(), acl));
            edges.push(Edge::constraint(
                iface,
                State::node_drop_acl_in(host),
                packets.complement(&acl),
            ));
        } else {
            edges.push(Edge::identity(iface, vrf.clone()));
        }
        edges.push(Edge::constraint(vrf.clone(), State::node_accept(host), local));
        edges.push(Edge::constraint(vrf.clone(), out.clone(), remote));
        edges.push(Edge::constraint(vrf, State::node_drop_no_route(host), no_route));
        edges.push(Edge::identity(out, link.clone()));
        let nat = if host == "r1" {
            Transition::rewrite(inside, PacketField::SrcIp, public)
        } else {
            Transition::Identity
        };
        edges.push(Edge::new(link, link_post_nat.clone(), nat));
        edges.push(Edge::identity(link_post_nat, State::pre_in_interface(peer, "e0")));
        edges.push(Edge::identity(State::node_accept(host), State::Accept));
    }

    Ok(StateGraph::from_edges(edges))
}

fn report(packets: &PacketBdd, title: &str, result: &BTreeMap<IngressLocation, Ref>) {
    println!("{}:", title);
    for (location, &set) in result {
        match packets.representative(set) {
            Some(example) => println!(
                "  {:<16} {} headers, e.g. {}",
                location.to_string(),
                packets.count(set),
                example
            ),
            None => println!("  {:<16} none", location.to_string()),
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let packets = PacketBdd::with_config(BddConfig::default().with_cache_bits(args.cache_bits));
    let graph = build_network(&packets)?;
    println!("graph = {:?}", graph);

    let ingress = [
        State::originate_vrf("r1", "default"),
        State::originate_vrf("r2", "default"),
    ];

    // Which headers get accepted by either router?
    let analysis = ReachabilityAnalysis::with_query_state(
        &packets,
        &graph,
        ingress,
        State::Accept,
        packets.full(),
    )?;
    let delivered = analysis.ingress_location_reachable();
    report(&packets, "Accepted", &delivered);

    let config = LoopDetectionConfig::default()
        .with_max_hops(args.max_hops)
        .with_steps_per_hop(args.steps_per_hop);
    let loops = LoopDetector::with_config(&analysis, config).detect_loops();
    report(&packets, "Looping", &loops);

    if args.dot {
        let rr = analysis.reverse_reachable_states();
        let dot = graph.to_dot_annotated(
            &rr,
            |set| format!("{} headers", packets.count(*set)),
            &DotConfig::default(),
        )?;
        println!("{}", dot);
    }

    let (hits, misses) = packets.bdd().cache_stats();
    info!(
        "BDD nodes: {}, cache hits: {}, misses: {}",
        packets.bdd().num_nodes(),
        hits,
        misses
    );

    let time_total = time_total.elapsed();
    println!("All done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
