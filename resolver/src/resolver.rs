use crate::{ResolveError, ResolverConfig, Result, Transport};
use dns_message::{build_query, Message, Type};
use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;
use tracing::{debug, info, info_span, warn, Instrument};

/// What a response tells the resolver to do next, in order of preference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Referral {
    /// An A record in the answer section.
    Answer(Ipv4Addr),

    /// An A record in the additional section, the address of one of the
    /// nameservers being referred to.
    Glue(Ipv4Addr),

    /// A nameserver from the authority section that has to be looked up
    /// before it can be asked.
    NameServer(String),

    /// Nothing to follow.
    Dead,
}

impl Referral {
    pub(crate) fn from_response(response: &Message) -> Self {
        if let Some(ip) = response.answers.iter().find_map(|rr| rr.data.as_a()) {
            return Referral::Answer(ip);
        }
        if let Some(ip) = response
            .additional_records
            .iter()
            .find_map(|rr| rr.data.as_a())
        {
            return Referral::Glue(ip);
        }
        if let Some(host) = response.name_servers.iter().find_map(|rr| rr.data.as_ns()) {
            return Referral::NameServer(host.to_string());
        }
        Referral::Dead
    }
}

#[derive(Debug)]
enum State {
    Querying(Ipv4Addr),
    ResolvingNameServer(String),
    Answered(Ipv4Addr),
}

/// Resolves names by walking down from the root server, following referrals
/// until some server answers with an address.
pub struct Resolver<T, R = StdRng> {
    config: ResolverConfig,
    transport: T,
    rng: R,
}

impl<T: Transport> Resolver<T> {
    /// Query ids are drawn from a [`StdRng`] seeded from the OS.
    pub fn new(config: ResolverConfig, transport: T) -> Self {
        Self::with_rng(config, transport, StdRng::from_entropy())
    }
}

impl<T, R> Resolver<T, R>
where
    T: Transport,
    R: Rng + Send,
{
    pub fn with_rng(config: ResolverConfig, transport: T, rng: R) -> Self {
        Self {
            config,
            transport,
            rng,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves `name` to an IPv4 address, asking each server for `q_type`
    /// records. Nameservers named without glue are looked up for `A` records
    /// whatever `q_type` is.
    pub async fn resolve(&mut self, name: &str, q_type: Type) -> Result<Ipv4Addr> {
        self.resolve_at_depth(name, q_type, 0).await
    }

    fn resolve_at_depth<'a>(
        &'a mut self,
        name: &'a str,
        q_type: Type,
        depth: usize,
    ) -> BoxFuture<'a, Result<Ipv4Addr>> {
        let span = info_span!("resolve", %name, %q_type, depth);
        async move {
            if depth > self.config.max_depth {
                return Err(ResolveError::DepthLimitExceeded {
                    name: name.to_string(),
                    depth: self.config.max_depth,
                });
            }

            let mut hops = 0;
            let mut state = State::Querying(self.config.root_server);
            loop {
                state = match state {
                    State::Querying(server) => {
                        if hops == self.config.max_hops {
                            return Err(ResolveError::HopLimitExceeded {
                                name: name.to_string(),
                                hops,
                            });
                        }
                        hops += 1;

                        let response = self.query(server, name, q_type).await?;
                        match Referral::from_response(&response) {
                            Referral::Answer(ip) => State::Answered(ip),
                            Referral::Glue(ip) => {
                                debug!("Following glue to {}", ip);
                                State::Querying(ip)
                            }
                            Referral::NameServer(host) => {
                                debug!("Referred to {} without glue", host);
                                State::ResolvingNameServer(host)
                            }
                            Referral::Dead => {
                                return Err(ResolveError::NoReferral {
                                    name: name.to_string(),
                                    server,
                                    rcode: response.header.flags.rcode(),
                                });
                            }
                        }
                    }
                    State::ResolvingNameServer(host) => {
                        let ip = self.resolve_at_depth(&host, Type::A, depth + 1).await?;
                        State::Querying(ip)
                    }
                    State::Answered(ip) => {
                        info!("Resolved {} to {} in {} queries", name, ip, hops);
                        return Ok(ip);
                    }
                };
            }
        }
        .instrument(span)
        .boxed()
    }

    async fn query(&mut self, server: Ipv4Addr, name: &str, q_type: Type) -> Result<Message> {
        let id: u16 = self.rng.gen();
        let query = build_query(name, q_type, id)?;

        info!("Querying {} for {}", server, name);
        let bytes = self.transport.exchange(server, &query).await?;
        let response = Message::from_bytes(&bytes)?;
        debug!("Got back: {}", response);

        if self.config.verify_responses {
            if response.header.id != id {
                return Err(ResolveError::IdMismatch {
                    server,
                    expected: id,
                    actual: response.header.id,
                });
            }
            if !response.header.flags.qr() {
                return Err(ResolveError::NotAResponse { server });
            }
        }

        if response.header.flags.tc() {
            warn!("Response from {} is truncated, using what arrived", server);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::setup;
    use async_trait::async_trait;
    use dns_message::{MessageBuilder, RCode, RData, ResourceRecord, ResourceRecordBuilder};
    use std::collections::HashMap;
    use std::io;

    const ROOT: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);
    const TLD: Ipv4Addr = Ipv4Addr::new(192, 5, 6, 30);
    const AUTH: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 53);
    const TARGET: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);

    /// Answers from a fixed table keyed on server and name, echoing the query
    /// id and question, and keeping a log of every query it was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: HashMap<(Ipv4Addr, String), Message>,
        calls: Vec<(Ipv4Addr, String, Type)>,
        ids: Vec<u16>,
        id_offset: u16,
        clear_qr: bool,
    }

    impl ScriptedTransport {
        fn respond(mut self, server: Ipv4Addr, name: &str, response: Message) -> Self {
            self.responses.insert((server, name.to_string()), response);
            self
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn exchange(&mut self, server: Ipv4Addr, query: &[u8]) -> Result<Vec<u8>> {
            let query = Message::from_bytes(query)?;
            let question = query.questions[0].clone();
            self.calls
                .push((server, question.q_name.clone(), question.q_type));
            self.ids.push(query.header.id);

            let mut response = self
                .responses
                .get(&(server, question.q_name.clone()))
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::TimedOut, "no scripted response"))?;
            response.header.id = query.header.id.wrapping_add(self.id_offset);
            response.header.flags.set_qr(!self.clear_qr);
            response.questions = vec![question];

            let mut buf = Vec::new();
            response.to_bytes(&mut buf)?;
            Ok(buf)
        }
    }

    fn a(name: &str, ip: Ipv4Addr) -> ResourceRecord {
        ResourceRecordBuilder::new(name, RData::A(ip))
            .ttl(3600)
            .build()
    }

    fn ns(zone: &str, host: &str) -> ResourceRecord {
        ResourceRecordBuilder::new(zone, RData::NS(host.to_string()))
            .ttl(172800)
            .build()
    }

    fn response() -> MessageBuilder {
        MessageBuilder::new().qr(true)
    }

    fn resolver(transport: ScriptedTransport) -> Resolver<ScriptedTransport> {
        resolver_with(ResolverConfig::default(), transport)
    }

    fn resolver_with(
        config: ResolverConfig,
        transport: ScriptedTransport,
    ) -> Resolver<ScriptedTransport> {
        Resolver::with_rng(config, transport, StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_referral_priority() {
        let full = response()
            .answer(a("example.com", TARGET))
            .name_server(ns("example.com", "ns1.example.com"))
            .additional_record(a("ns1.example.com", AUTH))
            .build()
            .unwrap();
        assert_eq!(Referral::from_response(&full), Referral::Answer(TARGET));

        let glue = response()
            .name_server(ns("example.com", "ns1.example.com"))
            .additional_record(
                ResourceRecordBuilder::new("ns1.example.com", RData::Raw(28, vec![0; 16])).build(),
            )
            .additional_record(a("ns1.example.com", AUTH))
            .build()
            .unwrap();
        assert_eq!(Referral::from_response(&glue), Referral::Glue(AUTH));

        let no_glue = response()
            .name_server(ResourceRecordBuilder::new("example.com", RData::Raw(6, vec![1])).build())
            .name_server(ns("example.com", "ns1.example.net"))
            .build()
            .unwrap();
        assert_eq!(
            Referral::from_response(&no_glue),
            Referral::NameServer("ns1.example.net".to_string())
        );

        let empty = response().rcode(RCode::NameError).build().unwrap();
        assert_eq!(Referral::from_response(&empty), Referral::Dead);
    }

    #[tokio::test]
    async fn test_answer_beats_authority() {
        setup();
        let transport = ScriptedTransport::default().respond(
            ROOT,
            "example.com",
            response()
                .answer(a("example.com", TARGET))
                .name_server(ns("example.com", "ns1.example.com"))
                .build()
                .unwrap(),
        );
        let mut resolver = resolver(transport);

        let ip = resolver.resolve("example.com", Type::A).await.unwrap();
        assert_eq!(ip, TARGET);
        assert_eq!(resolver.transport().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_response_is_still_used() {
        setup();
        let transport = ScriptedTransport::default().respond(
            ROOT,
            "example.com",
            response()
                .tc(true)
                .answer(a("example.com", TARGET))
                .build()
                .unwrap(),
        );
        let mut resolver = resolver(transport);

        let ip = resolver.resolve("example.com", Type::A).await.unwrap();
        assert_eq!(ip, TARGET);
        assert_eq!(resolver.transport().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_glue_skips_nameserver_lookup() {
        setup();
        let transport = ScriptedTransport::default()
            .respond(
                ROOT,
                "example.com",
                response()
                    .name_server(ns("example.com", "ns1.example.com"))
                    .additional_record(a("ns1.example.com", AUTH))
                    .build()
                    .unwrap(),
            )
            .respond(
                AUTH,
                "example.com",
                response()
                    .aa(true)
                    .answer(a("example.com", TARGET))
                    .build()
                    .unwrap(),
            );
        let mut resolver = resolver(transport);

        let ip = resolver.resolve("example.com", Type::A).await.unwrap();
        assert_eq!(ip.to_string(), "93.184.216.34");
        assert_eq!(
            resolver.transport().calls,
            vec![
                (ROOT, "example.com".to_string(), Type::A),
                (AUTH, "example.com".to_string(), Type::A),
            ]
        );
    }

    #[tokio::test]
    async fn test_walks_root_tld_authoritative() {
        setup();
        let transport = ScriptedTransport::default()
            .respond(
                ROOT,
                "www.example.com",
                response()
                    .name_server(ns("com", "a.gtld-servers.net"))
                    .additional_record(a("a.gtld-servers.net", TLD))
                    .build()
                    .unwrap(),
            )
            .respond(
                TLD,
                "www.example.com",
                response()
                    .name_server(ns("example.com", "ns1.example.com"))
                    .additional_record(a("ns1.example.com", AUTH))
                    .build()
                    .unwrap(),
            )
            .respond(
                AUTH,
                "www.example.com",
                response()
                    .answer(a("www.example.com", TARGET))
                    .build()
                    .unwrap(),
            );
        let mut resolver = resolver(transport);

        assert_eq!(
            resolver.resolve("www.example.com", Type::A).await.unwrap(),
            TARGET
        );
        let servers: Vec<Ipv4Addr> = resolver
            .transport()
            .calls
            .iter()
            .map(|(server, _, _)| *server)
            .collect();
        assert_eq!(servers, vec![ROOT, TLD, AUTH]);
    }

    #[tokio::test]
    async fn test_nameserver_without_glue_is_resolved_once() {
        setup();
        let transport = ScriptedTransport::default()
            .respond(
                ROOT,
                "example.com",
                response()
                    .name_server(ns("example.com", "ns1.dns.test"))
                    .build()
                    .unwrap(),
            )
            .respond(
                ROOT,
                "ns1.dns.test",
                response().answer(a("ns1.dns.test", AUTH)).build().unwrap(),
            )
            .respond(
                AUTH,
                "example.com",
                response().answer(a("example.com", TARGET)).build().unwrap(),
            );
        let mut resolver = resolver(transport);

        let ip = resolver.resolve("example.com", Type::A).await.unwrap();
        assert_eq!(ip, TARGET);
        assert_eq!(
            resolver.transport().calls,
            vec![
                (ROOT, "example.com".to_string(), Type::A),
                (ROOT, "ns1.dns.test".to_string(), Type::A),
                (AUTH, "example.com".to_string(), Type::A),
            ]
        );
    }

    #[tokio::test]
    async fn test_nameserver_lookup_asks_for_a() {
        setup();
        let transport = ScriptedTransport::default()
            .respond(
                ROOT,
                "example.com",
                response()
                    .name_server(ns("example.com", "ns1.dns.test"))
                    .build()
                    .unwrap(),
            )
            .respond(
                ROOT,
                "ns1.dns.test",
                response().answer(a("ns1.dns.test", AUTH)).build().unwrap(),
            )
            .respond(
                AUTH,
                "example.com",
                response().answer(a("example.com", TARGET)).build().unwrap(),
            );
        let mut resolver = resolver(transport);

        resolver.resolve("example.com", Type::NS).await.unwrap();
        let types: Vec<Type> = resolver
            .transport()
            .calls
            .iter()
            .map(|(_, _, t)| *t)
            .collect();
        assert_eq!(types, vec![Type::NS, Type::A, Type::NS]);
    }

    #[tokio::test]
    async fn test_no_referral_fails() {
        setup();
        let transport = ScriptedTransport::default().respond(
            ROOT,
            "nope.example",
            response().rcode(RCode::NameError).build().unwrap(),
        );
        let mut resolver = resolver(transport);

        match resolver.resolve("nope.example", Type::A).await {
            Err(ResolveError::NoReferral {
                name,
                server,
                rcode,
            }) => {
                assert_eq!(name, "nope.example");
                assert_eq!(server, ROOT);
                assert_eq!(rcode, RCode::NameError);
            }
            other => panic!("expected NoReferral, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_terminal() {
        setup();
        let mut resolver = resolver(ScriptedTransport::default());

        assert!(matches!(
            resolver.resolve("example.com", Type::A).await,
            Err(ResolveError::Transport(_))
        ));
        assert_eq!(resolver.transport().calls.len(), 1);
    }

    // Replies are checked against the query id and QR bit, which a resolver
    // that skips validation would accept.
    #[tokio::test]
    async fn test_rejects_mismatched_response_id() {
        setup();
        let mut transport = ScriptedTransport::default().respond(
            ROOT,
            "example.com",
            response().answer(a("example.com", TARGET)).build().unwrap(),
        );
        transport.id_offset = 1;
        let mut resolver = resolver(transport);

        match resolver.resolve("example.com", Type::A).await {
            Err(ResolveError::IdMismatch {
                server,
                expected,
                actual,
            }) => {
                assert_eq!(server, ROOT);
                assert_eq!(actual, expected.wrapping_add(1));
            }
            other => panic!("expected IdMismatch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejects_message_without_qr() {
        setup();
        let mut transport = ScriptedTransport::default().respond(
            ROOT,
            "example.com",
            response().answer(a("example.com", TARGET)).build().unwrap(),
        );
        transport.clear_qr = true;
        let mut resolver = resolver(transport);

        assert!(matches!(
            resolver.resolve("example.com", Type::A).await,
            Err(ResolveError::NotAResponse { server }) if server == ROOT
        ));
    }

    #[tokio::test]
    async fn test_unverified_responses_are_accepted() {
        setup();
        let mut transport = ScriptedTransport::default().respond(
            ROOT,
            "example.com",
            response().answer(a("example.com", TARGET)).build().unwrap(),
        );
        transport.id_offset = 7;
        transport.clear_qr = true;
        let config = ResolverConfig {
            verify_responses: false,
            ..ResolverConfig::default()
        };
        let mut resolver = resolver_with(config, transport);

        assert_eq!(
            resolver.resolve("example.com", Type::A).await.unwrap(),
            TARGET
        );
    }

    #[tokio::test]
    async fn test_glue_loop_hits_hop_limit() {
        setup();
        // The root keeps referring back to itself.
        let transport = ScriptedTransport::default().respond(
            ROOT,
            "loop.example",
            response()
                .name_server(ns("example", "a.root-servers.net"))
                .additional_record(a("a.root-servers.net", ROOT))
                .build()
                .unwrap(),
        );
        let config = ResolverConfig {
            max_hops: 5,
            ..ResolverConfig::default()
        };
        let mut resolver = resolver_with(config, transport);

        match resolver.resolve("loop.example", Type::A).await {
            Err(ResolveError::HopLimitExceeded { name, hops }) => {
                assert_eq!(name, "loop.example");
                assert_eq!(hops, 5);
            }
            other => panic!("expected HopLimitExceeded, got {:?}", other),
        }
        assert_eq!(resolver.transport().calls.len(), 5);
    }

    #[tokio::test]
    async fn test_nameserver_cycle_hits_depth_limit() {
        setup();
        // Each zone's only nameserver lives in the other zone.
        let transport = ScriptedTransport::default()
            .respond(
                ROOT,
                "ns.a.test",
                response()
                    .name_server(ns("a.test", "ns.b.test"))
                    .build()
                    .unwrap(),
            )
            .respond(
                ROOT,
                "ns.b.test",
                response()
                    .name_server(ns("b.test", "ns.a.test"))
                    .build()
                    .unwrap(),
            );
        let config = ResolverConfig {
            max_depth: 3,
            ..ResolverConfig::default()
        };
        let mut resolver = resolver_with(config, transport);

        match resolver.resolve("ns.a.test", Type::A).await {
            Err(ResolveError::DepthLimitExceeded { depth, .. }) => assert_eq!(depth, 3),
            other => panic!("expected DepthLimitExceeded, got {:?}", other),
        }
        // One query at each depth from 0 to 3.
        assert_eq!(resolver.transport().calls.len(), 4);
    }

    #[tokio::test]
    async fn test_seeded_ids_are_repeatable() {
        setup();
        let script = || {
            ScriptedTransport::default().respond(
                ROOT,
                "example.com",
                response().answer(a("example.com", TARGET)).build().unwrap(),
            )
        };

        let mut first = resolver(script());
        let mut second = resolver(script());
        first.resolve("example.com", Type::A).await.unwrap();
        second.resolve("example.com", Type::A).await.unwrap();

        assert_eq!(first.transport().ids, second.transport().ids);
    }

    #[tokio::test]
    async fn test_root_server_comes_from_config() {
        setup();
        let transport = ScriptedTransport::default().respond(
            TLD,
            "example.com",
            response().answer(a("example.com", TARGET)).build().unwrap(),
        );
        let config = ResolverConfig {
            root_server: TLD,
            ..ResolverConfig::default()
        };
        let mut resolver = resolver_with(config, transport);

        resolver.resolve("example.com", Type::A).await.unwrap();
        assert_eq!(resolver.config().root_server, TLD);
        assert_eq!(resolver.transport().calls[0].0, TLD);
    }
}
