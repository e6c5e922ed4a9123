mod test_room_full;
