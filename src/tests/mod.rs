mod test_width_contract;
