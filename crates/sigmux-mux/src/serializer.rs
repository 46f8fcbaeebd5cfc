use bytes::Bytes;
use sigmux_value::{encode_value_padded, Value};
use sigmux_wire::{
    pack_packet, PacketHeader, DEFAULT_MTU, FRAMING_RESERVE, HEADER_WORDS, HEADER_WORDS_TIMESTAMP,
    WORD_BYTES,
};

use crate::buffer::BufferPool;
use crate::error::{MuxError, Result};
use crate::stream::{Stream, StreamConfig, Tag};

/// One framed outbound unit. Ownership of the bytes has left the
/// serializer; the output channel may hold or forward them freely.
#[derive(Debug, Clone)]
pub struct Packet {
    bytes: Bytes,
}

impl Packet {
    /// The complete packet bytes, start marker through end marker.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Packet length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the packet is empty (never true for framed packets).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the packet, returning its bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Streaming-to-packet serializer across N input streams.
///
/// The host scheduler drives it by calling [`Serializer::step`]
/// repeatedly; each invocation emits at most one data packet plus any
/// control and tag packets that became due. Instances are
/// single-threaded and never invoked reentrantly.
#[derive(Debug)]
pub struct Serializer {
    streams: Vec<Stream>,
    pool: BufferPool,
    mtu: usize,
}

impl Serializer {
    /// Set up the topology: one entry per input stream, all sequence
    /// counters reset to zero. `mtu` bounds one data packet's buffer
    /// (default 1400 bytes).
    ///
    /// # Panics
    ///
    /// Panics if the MTU does not leave room for at least one item of
    /// every configured stream beyond the framing reserve.
    pub fn new(configs: &[StreamConfig], mtu: Option<usize>) -> Self {
        let mtu = mtu.unwrap_or(DEFAULT_MTU);
        assert!(mtu > FRAMING_RESERVE, "mtu must exceed the framing reserve");
        for config in configs {
            assert!(
                config.item_size <= mtu - FRAMING_RESERVE,
                "item size {} does not fit an mtu of {mtu}",
                config.item_size
            );
        }
        Self {
            streams: configs.iter().map(Stream::new).collect(),
            pool: BufferPool::new(mtu, 64),
            mtu,
        }
    }

    /// Number of configured input streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Items consumed from a stream since setup.
    pub fn consumed_items(&self, stream: usize) -> Result<u64> {
        Ok(self.stream_ref(stream)?.consumed())
    }

    /// Queue sample bytes on a stream. The slice must hold a whole
    /// number of items.
    pub fn push_samples(&mut self, stream: usize, bytes: &[u8]) -> Result<()> {
        self.stream_mut(stream)?.push_samples(bytes)
    }

    /// Queue a positional tag on a stream.
    pub fn push_tag(&mut self, stream: usize, tag: Tag) -> Result<()> {
        self.stream_mut(stream)?.push_tag(tag);
        Ok(())
    }

    /// Queue an asynchronous control message on a stream.
    pub fn push_message(&mut self, stream: usize, value: Value) -> Result<()> {
        self.stream_mut(stream)?.push_message(value);
        Ok(())
    }

    /// Whether any stream still has queued items or pending messages.
    pub fn has_pending(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.available_items() > 0 || s.has_pending_message())
    }

    /// One host-driven invocation.
    ///
    /// Streams are visited in increasing index order. For each stream,
    /// one pending control message (if any) is framed first. The first
    /// stream with at least one whole queued item then produces the
    /// invocation's single data packet: due tags (offset strictly below
    /// the end of the data window) are flushed in arrival order ahead
    /// of it, and the invocation returns immediately after the data
    /// packet. With no data anywhere, only messages are drained.
    ///
    /// Every framed packet consumes its stream's next sequence number,
    /// messages and tags included.
    pub fn step(&mut self) -> Vec<Packet> {
        let mut out = Vec::new();

        for i in 0..self.streams.len() {
            if let Some(msg) = self.streams[i].pop_message() {
                let seq = self.streams[i].next_seq();
                out.push(self.frame_value(seq, i as u32, None, &msg));
            }

            let available = self.streams[i].available_items();
            if available == 0 {
                continue;
            }

            // One output buffer per invocation; its capacity minus the
            // framing reserve bounds the data window.
            let mut buffer = self.pool.acquire(self.mtu);
            let budget = buffer.actual_capacity() - FRAMING_RESERVE;
            let item_size = self.streams[i].item_size();
            let num_items = available.min(budget / item_size);
            let num_words = num_items * item_size / WORD_BYTES;
            let num_bytes = num_words * WORD_BYTES;

            // Tags covering the window must go out before the data.
            let max_index = self.streams[i].consumed() + num_items as u64;
            for tag in self.streams[i].take_tags_below(max_index) {
                let seq = self.streams[i].next_seq();
                out.push(self.frame_value(seq, i as u32, Some(tag.offset), &tag.value));
            }

            let offset = HEADER_WORDS * WORD_BYTES;
            buffer.storage_mut()[offset..offset + num_bytes]
                .copy_from_slice(&self.streams[i].queued()[..num_bytes]);

            let header = PacketHeader {
                seq: self.streams[i].next_seq(),
                stream_id: i as u32,
                timestamp: None,
                is_control: false,
            };
            let total = pack_packet(&header, buffer.storage_mut(), offset, num_bytes);
            buffer.set_window(0, total);

            self.streams[i].consume(num_items);
            tracing::debug!(stream = i, items = num_items, bytes = total, "framed data packet");
            out.push(Packet {
                bytes: buffer.into_bytes(),
            });

            // The output buffer is spent; later streams wait for the
            // next invocation.
            return out;
        }

        out
    }

    /// Frame one value payload as a control packet (message when
    /// `timestamp` is `None`, tag otherwise).
    fn frame_value(
        &mut self,
        seq: u32,
        stream_id: u32,
        timestamp: Option<u64>,
        value: &Value,
    ) -> Packet {
        let payload = encode_value_padded(value);
        let hdr_words = if timestamp.is_some() {
            HEADER_WORDS_TIMESTAMP
        } else {
            HEADER_WORDS
        };
        let offset = hdr_words * WORD_BYTES;

        let mut buffer = self.pool.acquire(payload.len() + FRAMING_RESERVE);
        buffer.storage_mut()[offset..offset + payload.len()].copy_from_slice(&payload);

        let header = PacketHeader {
            seq,
            stream_id,
            timestamp,
            is_control: true,
        };
        let total = pack_packet(&header, buffer.storage_mut(), offset, payload.len());
        buffer.set_window(0, total);

        tracing::trace!(stream = stream_id, bytes = total, "framed control packet");
        Packet {
            bytes: buffer.into_bytes(),
        }
    }

    fn stream_ref(&self, index: usize) -> Result<&Stream> {
        self.streams.get(index).ok_or(MuxError::UnknownStream(index))
    }

    fn stream_mut(&mut self, index: usize) -> Result<&mut Stream> {
        self.streams
            .get_mut(index)
            .ok_or(MuxError::UnknownStream(index))
    }
}

#[cfg(test)]
mod tests {
    use sigmux_value::decode_value;
    use sigmux_wire::{unpack_packet, PacketKind};

    use super::*;

    const ITEM: usize = 8; // complex 32-bit pair

    fn mux(streams: usize) -> Serializer {
        let configs = vec![StreamConfig::new(ITEM); streams];
        Serializer::new(&configs, None)
    }

    fn ramp(items: usize) -> Vec<u8> {
        (0..items * ITEM).map(|b| b as u8).collect()
    }

    #[test]
    fn message_only_invocation_yields_one_control_packet() {
        let mut mux = mux(1);
        mux.push_message(0, Value::Str("retune".to_string())).unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 1);

        let decoded = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(decoded.kind(), PacketKind::Message);
        assert_eq!(decoded.stream_id, 0);
        assert_eq!(
            decode_value(decoded.payload).unwrap(),
            Value::Str("retune".to_string())
        );
    }

    #[test]
    fn empty_step_emits_nothing() {
        let mut mux = mux(2);
        assert!(mux.step().is_empty());
        assert!(!mux.has_pending());
    }

    #[test]
    fn data_window_bounded_by_mtu() {
        let mut mux = mux(1);
        mux.push_samples(0, &ramp(2000)).unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 1);

        // (1400 - 28) / 8 = 171 items per invocation.
        let decoded = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(decoded.kind(), PacketKind::Data);
        assert_eq!(decoded.payload.len(), 171 * ITEM);
        assert_eq!(mux.consumed_items(0).unwrap(), 171);
        assert!(mux.has_pending());
    }

    #[test]
    fn data_payload_copied_verbatim() {
        let mut mux = mux(1);
        let samples = ramp(16);
        mux.push_samples(0, &samples).unwrap();

        let packets = mux.step();
        let decoded = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(decoded.payload, samples.as_slice());
        assert_eq!(mux.consumed_items(0).unwrap(), 16);
        assert!(!mux.has_pending());
    }

    #[test]
    fn every_packet_is_well_formed() {
        let mut mux = mux(1);
        mux.push_samples(0, &ramp(10)).unwrap();
        mux.push_tag(0, Tag::new(0, Value::Int(5))).unwrap();
        mux.push_message(0, Value::Bool(true)).unwrap();

        for packet in mux.step() {
            let bytes = packet.as_bytes();
            assert_eq!(&bytes[0..4], b"VRLP");
            assert_eq!(&bytes[bytes.len() - 4..], b"VEND");
            assert!(unpack_packet(bytes).is_ok());
        }
    }

    #[test]
    fn tags_flush_before_data_in_arrival_order() {
        let mut mux = mux(1);
        mux.push_samples(0, &ramp(100)).unwrap();
        mux.push_tag(0, Tag::new(5, Value::Str("b".to_string()))).unwrap();
        mux.push_tag(0, Tag::new(0, Value::Str("a".to_string()))).unwrap();
        // Beyond the first window; must be deferred.
        mux.push_tag(0, Tag::new(5000, Value::Str("later".to_string())))
            .unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 3);

        let first = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(first.kind(), PacketKind::Tag);
        assert_eq!(first.timestamp, Some(5));
        assert_eq!(
            decode_value(first.payload).unwrap(),
            Value::Str("b".to_string())
        );

        let second = unpack_packet(packets[1].as_bytes()).unwrap();
        assert_eq!(second.kind(), PacketKind::Tag);
        assert_eq!(second.timestamp, Some(0));

        let third = unpack_packet(packets[2].as_bytes()).unwrap();
        assert_eq!(third.kind(), PacketKind::Data);
    }

    #[test]
    fn deferred_tag_flushes_once_window_reaches_it() {
        let mut mux = mux(1);
        mux.push_samples(0, &ramp(200)).unwrap();
        mux.push_tag(0, Tag::new(180, Value::Int(1))).unwrap();

        // First window covers items 0..171; the tag at 180 waits.
        let first = mux.step();
        assert_eq!(first.len(), 1);
        assert_eq!(
            unpack_packet(first[0].as_bytes()).unwrap().kind(),
            PacketKind::Data
        );

        // Second window covers 171..200 and flushes it.
        let second = mux.step();
        assert_eq!(second.len(), 2);
        let tag = unpack_packet(second[0].as_bytes()).unwrap();
        assert_eq!(tag.kind(), PacketKind::Tag);
        assert_eq!(tag.timestamp, Some(180));
    }

    #[test]
    fn one_data_packet_per_invocation() {
        let mut mux = mux(2);
        mux.push_samples(0, &ramp(4)).unwrap();
        mux.push_samples(1, &ramp(4)).unwrap();

        let first = mux.step();
        assert_eq!(first.len(), 1);
        assert_eq!(unpack_packet(first[0].as_bytes()).unwrap().stream_id, 0);

        let second = mux.step();
        assert_eq!(second.len(), 1);
        assert_eq!(unpack_packet(second[0].as_bytes()).unwrap().stream_id, 1);
    }

    #[test]
    fn earlier_stream_messages_drain_before_later_data() {
        let mut mux = mux(2);
        mux.push_message(0, Value::Str("cfg".to_string())).unwrap();
        mux.push_samples(1, &ramp(4)).unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 2);
        assert_eq!(
            unpack_packet(packets[0].as_bytes()).unwrap().kind(),
            PacketKind::Message
        );
        let data = unpack_packet(packets[1].as_bytes()).unwrap();
        assert_eq!(data.kind(), PacketKind::Data);
        assert_eq!(data.stream_id, 1);
    }

    #[test]
    fn later_streams_unvisited_after_data_packet() {
        let mut mux = mux(2);
        mux.push_samples(0, &ramp(4)).unwrap();
        mux.push_message(1, Value::Bool(true)).unwrap();

        // Stream 0 produces the data packet and the invocation returns
        // before stream 1 is visited.
        let packets = mux.step();
        assert_eq!(packets.len(), 1);
        assert_eq!(
            unpack_packet(packets[0].as_bytes()).unwrap().kind(),
            PacketKind::Data
        );

        // The message goes out on the next invocation.
        let next = mux.step();
        assert_eq!(next.len(), 1);
        assert_eq!(
            unpack_packet(next[0].as_bytes()).unwrap().kind(),
            PacketKind::Message
        );
    }

    #[test]
    fn message_drain_is_one_per_stream_per_step() {
        let mut mux = mux(1);
        mux.push_message(0, Value::Int(1)).unwrap();
        mux.push_message(0, Value::Int(2)).unwrap();

        assert_eq!(mux.step().len(), 1);
        assert_eq!(mux.step().len(), 1);
        assert!(mux.step().is_empty());
    }

    #[test]
    fn no_data_drains_messages_on_all_streams() {
        let mut mux = mux(3);
        mux.push_message(0, Value::Int(0)).unwrap();
        mux.push_message(2, Value::Int(2)).unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 2);
        assert_eq!(unpack_packet(packets[0].as_bytes()).unwrap().stream_id, 0);
        assert_eq!(unpack_packet(packets[1].as_bytes()).unwrap().stream_id, 2);
    }

    #[test]
    fn sequence_numbers_count_all_packet_kinds() {
        let mut mux = mux(2);
        mux.push_message(0, Value::Bool(true)).unwrap();
        mux.push_tag(0, Tag::new(0, Value::Int(1))).unwrap();
        mux.push_samples(0, &ramp(4)).unwrap();
        mux.push_message(1, Value::Bool(false)).unwrap();

        // Stream 0: message seq 0, tag seq 1, data seq 2.
        let packets = mux.step();
        assert_eq!(packets.len(), 3);
        assert_eq!(mux.streams[0].seq(), 3);
        // Stream 1 was never visited; its counter is untouched.
        assert_eq!(mux.streams[1].seq(), 0);

        mux.step();
        assert_eq!(mux.streams[1].seq(), 1);
    }

    #[test]
    fn unencodable_message_still_produces_a_packet() {
        let mut mux = mux(1);
        mux.push_message(0, Value::Float(f64::NAN)).unwrap();

        let packets = mux.step();
        assert_eq!(packets.len(), 1);
        let decoded = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(decode_value(decoded.payload).unwrap(), Value::Null);
    }

    #[test]
    fn feeding_unknown_stream_fails() {
        let mut mux = mux(1);
        assert!(matches!(
            mux.push_samples(1, &ramp(1)),
            Err(MuxError::UnknownStream(1))
        ));
        assert!(matches!(
            mux.push_message(9, Value::Null),
            Err(MuxError::UnknownStream(9))
        ));
    }

    #[test]
    fn custom_mtu_shrinks_the_window() {
        let configs = [StreamConfig::new(ITEM)];
        let mut mux = Serializer::new(&configs, Some(100));
        mux.push_samples(0, &ramp(64)).unwrap();

        // (100 - 28) / 8 = 9 items.
        let packets = mux.step();
        let decoded = unpack_packet(packets[0].as_bytes()).unwrap();
        assert_eq!(decoded.payload.len(), 9 * ITEM);
    }

    #[test]
    #[should_panic(expected = "does not fit an mtu")]
    fn oversized_item_rejected_at_setup() {
        Serializer::new(&[StreamConfig::new(4096)], Some(100));
    }
}
