use crate::{
    Class, Flags, Header, Message, OpCode, Question, RCode, RData, ResourceRecord, Result, Type,
};
use std::default::Default;

/// Builds a [`Message`]. Flag setters write straight into the header
/// [`Flags`]; the opcode and rcode are checked for width in [`Self::build`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    id: u16,
    flags: Flags,
    opcode: OpCode,
    rcode: RCode,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    name_servers: Vec<ResourceRecord>,
    additional_records: Vec<ResourceRecord>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Fails if an [`OpCode::Unknown`] or [`RCode::Unknown`] does not fit in
    /// its 4 bit field.
    pub fn build(self) -> Result<Message> {
        let mut flags = self.flags;
        flags.set_opcode(self.opcode)?;
        flags.set_rcode(self.rcode)?;

        Ok(Message {
            header: Header { id: self.id, flags },
            questions: self.questions,
            answers: self.answers,
            name_servers: self.name_servers,
            additional_records: self.additional_records,
        })
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    fn flag(mut self, set: fn(&mut Flags, bool), value: bool) -> Self {
        set(&mut self.flags, value);
        self
    }

    pub fn qr(self, qr: bool) -> Self {
        self.flag(Flags::set_qr, qr)
    }

    pub fn aa(self, aa: bool) -> Self {
        self.flag(Flags::set_aa, aa)
    }

    pub fn tc(self, tc: bool) -> Self {
        self.flag(Flags::set_tc, tc)
    }

    pub fn rd(self, rd: bool) -> Self {
        self.flag(Flags::set_rd, rd)
    }

    pub fn ra(self, ra: bool) -> Self {
        self.flag(Flags::set_ra, ra)
    }

    pub fn ad(self, ad: bool) -> Self {
        self.flag(Flags::set_ad, ad)
    }

    pub fn cd(self, cd: bool) -> Self {
        self.flag(Flags::set_cd, cd)
    }

    pub fn opcode(mut self, opcode: OpCode) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn rcode(mut self, rcode: RCode) -> Self {
        self.rcode = rcode;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn answer(mut self, answer: ResourceRecord) -> Self {
        self.answers.push(answer);
        self
    }

    /// Adds a record to the authority section.
    pub fn name_server(mut self, ns: ResourceRecord) -> Self {
        self.name_servers.push(ns);
        self
    }

    pub fn additional_record(mut self, ar: ResourceRecord) -> Self {
        self.additional_records.push(ar);
        self
    }
}

#[derive(Debug, Default)]
pub struct QuestionBuilder {
    q_name: String,
    q_type: Type,
    q_class: Class,
}

impl QuestionBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> Question {
        Question {
            q_name: self.q_name,
            q_type: self.q_type,
            q_class: self.q_class,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.q_name = name.to_string();
        self
    }

    pub fn q_type(mut self, t: Type) -> Self {
        self.q_type = t;
        self
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.q_class = cls;
        self
    }
}

#[derive(Debug)]
pub struct ResourceRecordBuilder {
    name: String,
    data: RData,
    class: Class,
    ttl: u32,
}

impl ResourceRecordBuilder {
    pub fn new(name: &str, data: RData) -> Self {
        Self {
            name: name.to_string(),
            data,
            class: Default::default(),
            ttl: Default::default(),
        }
    }

    pub fn build(self) -> ResourceRecord {
        ResourceRecord {
            name: self.name,
            data: self.data,
            class: self.class,
            ttl: self.ttl,
        }
    }

    pub fn class(mut self, cls: Class) -> Self {
        self.class = cls;
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}
